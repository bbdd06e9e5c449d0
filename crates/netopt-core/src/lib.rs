//! # Network Optimizer Core
//!
//! 核心資料模型與類型定義（網路拓撲、情境參數、求解結果、配置）

pub mod config;
pub mod loader;
pub mod network;
pub mod scenario;
pub mod solution;
pub mod topology;

// Re-export 主要類型
pub use config::{EmissionFactors, InsightThresholds, OptimizerConfig, ResilienceWeights};
pub use network::{DistributionCenter, Location, Market, Plant, Route, RouteClass, RouteKey, TransportMode};
pub use scenario::{CostMultipliers, RouteCapacity, ScenarioSpec};
pub use solution::{CostBreakdown, CostComponent, FlowSolution, RouteFlow, SolveStatus};
pub use topology::Topology;

/// 網路優化錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum NetoptError {
    #[error("未知的情境: {0}")]
    UnknownScenario(String),

    #[error("情境已存在: {0}")]
    DuplicateScenario(String),

    #[error("情境 {scenario} 的約束無法同時滿足（不可行）")]
    Infeasible { scenario: String },

    #[error("情境 {scenario} 求解超過時間上限，未取得最佳解")]
    SolverTimeout { scenario: String },

    #[error("求解器錯誤: {0}")]
    SolverFailure(String),

    #[error("找不到工廠: {0}")]
    UnknownPlant(String),

    #[error("找不到配送中心: {0}")]
    UnknownDistributionCenter(String),

    #[error("找不到路線: {origin} -> {destination}")]
    UnknownRoute { origin: String, destination: String },

    #[error("無效的網路拓撲: {0}")]
    InvalidTopology(String),

    #[error("無效的情境參數: {0}")]
    InvalidOverride(String),

    #[error("無效的配置: {0}")]
    InvalidConfig(String),

    #[error("讀取資料失敗: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 解析錯誤: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON 解析錯誤: {0}")]
    Json(#[from] serde_json::Error),
}

impl NetoptError {
    /// 機器可讀的錯誤種類（供 API 層組裝結構化錯誤）
    pub fn kind(&self) -> &'static str {
        match self {
            NetoptError::UnknownScenario(_) => "unknown_scenario",
            NetoptError::DuplicateScenario(_) => "duplicate_scenario",
            NetoptError::Infeasible { .. } => "infeasible",
            NetoptError::SolverTimeout { .. } => "solver_timeout",
            NetoptError::SolverFailure(_) => "solver_failure",
            NetoptError::UnknownPlant(_)
            | NetoptError::UnknownDistributionCenter(_)
            | NetoptError::UnknownRoute { .. }
            | NetoptError::InvalidOverride(_) => "invalid_override",
            NetoptError::InvalidTopology(_) => "invalid_topology",
            NetoptError::InvalidConfig(_) => "invalid_config",
            NetoptError::Io(_) | NetoptError::Csv(_) | NetoptError::Json(_) => "data_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, NetoptError>;
