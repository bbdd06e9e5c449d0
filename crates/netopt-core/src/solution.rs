//! 求解結果模型

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::network::RouteClass;
use crate::{NetoptError, Result};

/// 求解狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// 最佳解
    Optimal,
    /// 不可行
    Infeasible,
    /// 達到時間上限
    TimeLimitReached,
    /// 求解器內部錯誤
    SolverError,
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        *self == SolveStatus::Optimal
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::TimeLimitReached => "time_limit_reached",
            SolveStatus::SolverError => "solver_error",
        }
    }
}

/// 成本組成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostComponent {
    Production,
    TransportPlantDc,
    TransportDcMarket,
    Warehousing,
    UnmetPenalty,
}

impl CostComponent {
    pub const ALL: [CostComponent; 5] = [
        CostComponent::Production,
        CostComponent::TransportPlantDc,
        CostComponent::TransportDcMarket,
        CostComponent::Warehousing,
        CostComponent::UnmetPenalty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CostComponent::Production => "production",
            CostComponent::TransportPlantDc => "transport_plant_dc",
            CostComponent::TransportDcMarket => "transport_dc_market",
            CostComponent::Warehousing => "warehousing",
            CostComponent::UnmetPenalty => "unmet_penalty",
        }
    }

    /// 顯示名稱
    pub fn label(&self) -> &'static str {
        match self {
            CostComponent::Production => "Production",
            CostComponent::TransportPlantDc => "Plant-DC transport",
            CostComponent::TransportDcMarket => "DC-market transport",
            CostComponent::Warehousing => "Warehousing",
            CostComponent::UnmetPenalty => "Unmet demand penalty",
        }
    }
}

/// 目標值分解
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub production: f64,
    pub transport_plant_dc: f64,
    pub transport_dc_market: f64,
    pub warehousing: f64,
    pub unmet_penalty: f64,
}

impl CostBreakdown {
    pub fn get(&self, component: CostComponent) -> f64 {
        match component {
            CostComponent::Production => self.production,
            CostComponent::TransportPlantDc => self.transport_plant_dc,
            CostComponent::TransportDcMarket => self.transport_dc_market,
            CostComponent::Warehousing => self.warehousing,
            CostComponent::UnmetPenalty => self.unmet_penalty,
        }
    }

    /// 各組成合計
    pub fn total(&self) -> f64 {
        self.production
            + self.transport_plant_dc
            + self.transport_dc_market
            + self.warehousing
            + self.unmet_penalty
    }

    /// 依固定順序迭代 (組成, 金額)
    pub fn iter(&self) -> impl Iterator<Item = (CostComponent, f64)> + '_ {
        CostComponent::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// 單一路線的分配量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteFlow {
    pub origin: String,
    pub destination: String,
    pub class: RouteClass,
    pub volume: f64,
}

/// 網路流量解
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSolution {
    /// 求解批次ID
    pub run_id: Uuid,

    /// 情境ID
    pub scenario_id: String,

    /// 求解狀態
    pub status: SolveStatus,

    /// 目標值（恆等於 cost_breakdown 合計）
    pub objective_value: f64,

    /// 目標值分解
    pub cost_breakdown: CostBreakdown,

    /// 所有合格路線的分配量（含 0）
    pub flows: Vec<RouteFlow>,

    /// 各工廠產出（= 工廠流出量）
    pub production: BTreeMap<String, f64>,

    /// 各配送中心吞吐量（= 流出量）
    pub dc_throughput: BTreeMap<String, f64>,

    /// 各市場未滿足需求
    pub unmet_demand: BTreeMap<String, f64>,

    /// 總需求
    pub total_demand: f64,

    /// 此情境實際停用的工廠
    pub disabled_plants: BTreeSet<String>,

    /// 求解耗時（毫秒）
    pub solve_time_ms: u64,

    /// 求解時間
    pub solved_at: DateTime<Utc>,
}

impl FlowSolution {
    /// 未滿足需求合計
    pub fn total_unmet(&self) -> f64 {
        self.unmet_demand.values().sum()
    }

    /// 已滿足需求
    pub fn fulfilled_demand(&self) -> f64 {
        (self.total_demand - self.total_unmet()).max(0.0)
    }

    /// 滿足率（百分比）；無需求時視為 100%
    pub fn fill_rate_pct(&self) -> f64 {
        if self.total_demand > 0.0 {
            (1.0 - self.total_unmet() / self.total_demand) * 100.0
        } else {
            100.0
        }
    }

    /// 總產出
    pub fn total_production(&self) -> f64 {
        self.production.values().sum()
    }

    /// 指定類別的流量
    pub fn flows_of(&self, class: RouteClass) -> impl Iterator<Item = &RouteFlow> {
        self.flows.iter().filter(move |f| f.class == class)
    }

    /// 單一路線的流量
    pub fn flow(&self, origin: &str, destination: &str) -> Option<f64> {
        self.flows
            .iter()
            .find(|f| f.origin == origin && f.destination == destination)
            .map(|f| f.volume)
    }

    /// 市場流入量
    pub fn market_inflow(&self, market_id: &str) -> f64 {
        self.flows_of(RouteClass::DcToMarket)
            .filter(|f| f.destination == market_id)
            .map(|f| f.volume)
            .sum()
    }

    /// 配送中心流入量
    pub fn dc_inflow(&self, dc_id: &str) -> f64 {
        self.flows_of(RouteClass::PlantToDc)
            .filter(|f| f.destination == dc_id)
            .map(|f| f.volume)
            .sum()
    }

    /// 非最佳解不可作為業務結果，轉為對應錯誤
    pub fn ensure_optimal(&self) -> Result<()> {
        match self.status {
            SolveStatus::Optimal => Ok(()),
            SolveStatus::Infeasible => Err(NetoptError::Infeasible {
                scenario: self.scenario_id.clone(),
            }),
            SolveStatus::TimeLimitReached => Err(NetoptError::SolverTimeout {
                scenario: self.scenario_id.clone(),
            }),
            SolveStatus::SolverError => Err(NetoptError::SolverFailure(format!(
                "情境 {} 的解標記為求解器錯誤",
                self.scenario_id
            ))),
        }
    }
}
