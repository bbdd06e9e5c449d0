//! 情境目錄

use netopt_core::{NetoptError, Result, ScenarioSpec, Topology};
use serde::{Deserialize, Serialize};

pub const BASELINE: &str = "baseline";
pub const COST_OPTIMIZED: &str = "cost_optimized";
pub const DISRUPTION: &str = "disruption";

/// 成本優化情境的最低滿足率
const COST_OPTIMIZED_FILL_FLOOR: f64 = 0.90;

/// 情境定義：業務說明 + 參數覆寫
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub objective: String,
    pub use_case: String,
    pub trade_offs: String,
    pub spec: ScenarioSpec,
}

impl ScenarioDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, spec: ScenarioSpec) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            objective: String::new(),
            use_case: String::new(),
            trade_offs: String::new(),
            spec,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objective = objective.into();
        self
    }

    pub fn with_use_case(mut self, use_case: impl Into<String>) -> Self {
        self.use_case = use_case.into();
        self
    }

    pub fn with_trade_offs(mut self, trade_offs: impl Into<String>) -> Self {
        self.trade_offs = trade_offs.into();
        self
    }
}

/// 有序的情境目錄（保留註冊順序）
#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    scenarios: Vec<ScenarioDefinition>,
}

impl ScenarioCatalog {
    /// 空目錄
    pub fn new() -> Self {
        Self::default()
    }

    /// 標準三情境：基準、成本優化、最大工廠停擺
    pub fn standard(topology: &Topology) -> Self {
        let mut scenarios = vec![
            ScenarioDefinition::new(BASELINE, "Current Network (Baseline)", ScenarioSpec::baseline())
                .with_objective("Understand current performance")
                .with_description(
                    "Models existing network with actual costs and service levels. \
                     Provides benchmark for measuring improvement opportunities.",
                )
                .with_use_case("Performance assessment, identifying gaps, strategic planning baseline")
                .with_trade_offs("None - represents current state"),
            ScenarioDefinition::new(
                COST_OPTIMIZED,
                "Cost Minimization",
                ScenarioSpec::baseline().with_min_fill_rate(COST_OPTIMIZED_FILL_FLOOR),
            )
            .with_objective("Maximize profitability")
            .with_description(
                "Minimize total network cost while maintaining at least 90% fill rate. \
                 Allows the model to find the most efficient plant-DC-market flows.",
            )
            .with_use_case("Budget pressure, margin improvement initiatives, efficiency programs")
            .with_trade_offs("May increase lead times, potentially higher CO2 emissions"),
        ];

        let mut disruption_spec = ScenarioSpec::baseline();
        let description = match topology.largest_plant() {
            Some(plant) => {
                let share = if topology.total_capacity() > 0.0 {
                    plant.annual_capacity / topology.total_capacity() * 100.0
                } else {
                    0.0
                };
                disruption_spec = disruption_spec.with_disabled_plant(plant.id.clone());
                format!(
                    "Simulate an outage of the largest production facility ({}, {:.0}% of capacity). \
                     Tests network resilience and identifies backup capacity requirements.",
                    plant.name, share
                )
            }
            None => {
                tracing::warn!("拓撲中沒有啟用的工廠，停擺情境不停用任何工廠");
                "Simulate an outage of the largest production facility.".to_string()
            }
        };

        scenarios.push(
            ScenarioDefinition::new(DISRUPTION, "Largest Plant Shutdown", disruption_spec)
                .with_objective("Test supply chain resilience")
                .with_description(description)
                .with_use_case("Risk assessment, contingency planning, resilience investment justification")
                .with_trade_offs("Fill rate drop during disruption, cost increase from unmet demand"),
        );

        Self { scenarios }
    }

    /// 註冊新情境；ID 重複時失敗
    pub fn register(&mut self, definition: ScenarioDefinition) -> Result<()> {
        if self.get(&definition.id).is_some() {
            return Err(NetoptError::DuplicateScenario(definition.id));
        }
        tracing::debug!("註冊情境 {}", definition.id);
        self.scenarios.push(definition);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ScenarioDefinition> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// 依ID取得情境，不存在時回傳 `UnknownScenario`
    pub fn require(&self, id: &str) -> Result<&ScenarioDefinition> {
        self.get(id).ok_or_else(|| NetoptError::UnknownScenario(id.to_string()))
    }

    pub fn list(&self) -> &[ScenarioDefinition] {
        &self.scenarios
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.scenarios.iter().map(|s| s.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
