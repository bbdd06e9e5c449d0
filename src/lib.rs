//! # NetOpt
//!
//! 供應鏈網路優化引擎
//!
//! - 線性規劃網路模型（工廠 → 配送中心 → 市場）
//! - 情境目錄與並行情境求解
//! - KPI、敘述文字與優先級洞察
//! - API 回應格式與 CSV 報表

pub mod payload;
pub mod report;
pub mod service;

pub use netopt_core::{
    CostBreakdown, CostComponent, CostMultipliers, DistributionCenter, FlowSolution, Location, Market, NetoptError,
    OptimizerConfig, Plant, Result, Route, ScenarioSpec, SolveStatus, Topology, TransportMode,
};
pub use netopt_kpi::{Analysis, Insight, InsightKind, Kpi, KpiEngine, KpiName, KpiSet, Priority};
pub use netopt_model::{default_backend, optimize_network, LpBackend};
pub use netopt_scenario::{ScenarioCatalog, ScenarioComparison, ScenarioDefinition, ScenarioEngine, BASELINE, COST_OPTIMIZED, DISRUPTION};

pub use payload::{ApiResponse, ErrorResponse, KpisResponse, NetworkDataResponse, OptimizeResponse, ScenarioSummary};
pub use report::{export_report, Report};
pub use service::NetworkOptimizer;

