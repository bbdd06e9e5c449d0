//! # Network Scenario Engine
//!
//! 情境目錄、情境執行與基準比較

pub mod catalog;
pub mod comparison;
pub mod engine;

pub use catalog::{ScenarioCatalog, ScenarioDefinition, BASELINE, COST_OPTIMIZED, DISRUPTION};
pub use comparison::{Interpretation, MetricDelta, ScenarioComparison};
pub use engine::{ScenarioEngine, ScenarioRun};
