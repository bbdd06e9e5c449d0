//! 情境與基準的比較

use std::collections::BTreeMap;

use netopt_core::{CostComponent, FlowSolution};
use serde::Serialize;

/// 變化方向的業務解讀
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpretation {
    Savings,
    Increase,
    Improvement,
    Degradation,
    Stronger,
    Weaker,
    Unchanged,
}

/// 單一指標的差異
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDelta {
    pub absolute: f64,
    /// 相對基準的百分比變化；基準為 0 時不適用
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    pub interpretation: Interpretation,
}

impl MetricDelta {
    fn new(candidate: f64, baseline: f64, lower: Interpretation, higher: Interpretation) -> Self {
        let absolute = candidate - baseline;
        let interpretation = if absolute < 0.0 {
            lower
        } else if absolute > 0.0 {
            higher
        } else {
            Interpretation::Unchanged
        };
        Self {
            absolute,
            percent: (baseline != 0.0).then(|| (candidate / baseline - 1.0) * 100.0),
            interpretation,
        }
    }
}

/// 候選解與基準解的比較
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioComparison {
    pub scenario_id: String,
    pub baseline_id: String,

    /// 各成本組成差異（候選 - 基準）
    pub component_deltas: BTreeMap<CostComponent, f64>,

    /// 總成本差異
    pub cost: MetricDelta,

    /// 滿足率差異（百分點）
    pub fill_rate: MetricDelta,

    /// 韌性分數差異（由 KPI 層補上）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resilience: Option<MetricDelta>,
}

impl ScenarioComparison {
    pub fn between(candidate: &FlowSolution, baseline: &FlowSolution) -> Self {
        let component_deltas = CostComponent::ALL
            .into_iter()
            .map(|c| (c, candidate.cost_breakdown.get(c) - baseline.cost_breakdown.get(c)))
            .collect();

        let mut fill_rate = MetricDelta::new(
            candidate.fill_rate_pct(),
            baseline.fill_rate_pct(),
            Interpretation::Degradation,
            Interpretation::Improvement,
        );
        // 百分比指標的差異以百分點表示
        fill_rate.percent = None;

        Self {
            scenario_id: candidate.scenario_id.clone(),
            baseline_id: baseline.scenario_id.clone(),
            component_deltas,
            cost: MetricDelta::new(
                candidate.objective_value,
                baseline.objective_value,
                Interpretation::Savings,
                Interpretation::Increase,
            ),
            fill_rate,
            resilience: None,
        }
    }

    /// 補上韌性分數差異
    pub fn with_resilience(mut self, candidate_score: f64, baseline_score: f64) -> Self {
        self.resilience = Some(MetricDelta::new(
            candidate_score,
            baseline_score,
            Interpretation::Weaker,
            Interpretation::Stronger,
        ));
        self
    }

    /// 總成本差異（EUR）
    pub fn cost_delta(&self) -> f64 {
        self.cost.absolute
    }

    /// 總成本百分比差異
    pub fn cost_delta_pct(&self) -> Option<f64> {
        self.cost.percent
    }

    /// 滿足率差異（百分點）
    pub fn fill_rate_delta_pp(&self) -> f64 {
        self.fill_rate.absolute
    }

    pub fn component_delta(&self, component: CostComponent) -> f64 {
        self.component_deltas.get(&component).copied().unwrap_or(0.0)
    }
}
