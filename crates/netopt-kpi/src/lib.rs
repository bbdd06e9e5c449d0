//! # Network KPI Engine
//!
//! 由流量解計算業務 KPI、敘述文字與排序後的洞察

pub mod engine;
pub mod format;
pub mod insight;
pub mod kpi;
pub mod metrics;
pub mod narrative;

pub use engine::{Analysis, KpiEngine, CO2_TARGET_TONNES, COST_PER_UNIT_BUDGET_EUR, RESILIENCE_BEST_PRACTICE};
pub use insight::{classify_priority, Insight, InsightKind, Priority};
pub use kpi::{Kpi, KpiDelta, KpiName, KpiSet};
pub use metrics::{NetworkMetrics, ResilienceBreakdown};
