//! KPI 與洞察引擎

use std::time::Instant;

use netopt_core::{CostComponent, FlowSolution, OptimizerConfig, Result, Topology};
use netopt_scenario::ScenarioComparison;
use serde::Serialize;

use crate::format;
use crate::insight::{self, classify_priority, Insight, InsightContext};
use crate::kpi::{Kpi, KpiDelta, KpiName, KpiSet};
use crate::metrics::NetworkMetrics;
use crate::narrative::{self, RuleTable};

/// 年度排放目標（噸 CO2）
pub const CO2_TARGET_TONNES: f64 = 40_000.0;

/// 單位成本預算（EUR）
pub const COST_PER_UNIT_BUDGET_EUR: f64 = 0.244;

/// 韌性分數業界最佳實務
pub const RESILIENCE_BEST_PRACTICE: f64 = 80.0;

/// 成本驅動因素的占比門檻
const COST_DRIVER_SHARES: [(CostComponent, f64); 3] = [
    (CostComponent::TransportPlantDc, 0.30),
    (CostComponent::Warehousing, 0.25),
    (CostComponent::Production, 0.25),
];

/// 一次分析的完整輸出
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub scenario_id: String,
    pub kpis: KpiSet,
    pub insights: Vec<Insight>,
    /// 無基準時為 None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ScenarioComparison>,
    pub metrics: NetworkMetrics,
}

/// KPI 與洞察引擎
#[derive(Debug, Clone, Default)]
pub struct KpiEngine {
    config: OptimizerConfig,
}

impl KpiEngine {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// 計算 KPI 集合與排序後的洞察
    ///
    /// 非最佳解直接回傳錯誤；非最佳的基準解視為無基準。
    pub fn analyze(&self, topology: &Topology, solution: &FlowSolution, baseline: Option<&FlowSolution>) -> Result<Analysis> {
        let start = Instant::now();
        tracing::info!("開始計算情境 {} 的 KPI", solution.scenario_id);

        solution.ensure_optimal()?;

        let baseline = baseline.filter(|b| {
            let usable = b.status.is_optimal();
            if !usable {
                tracing::warn!("基準解 {} 非最佳解（{}），略過比較", b.scenario_id, b.status.as_str());
            }
            usable
        });

        let metrics = NetworkMetrics::compute(topology, solution, &self.config);
        let baseline_metrics = baseline.map(|b| NetworkMetrics::compute(topology, b, &self.config));
        let comparison = baseline.zip(baseline_metrics.as_ref()).map(|(b, bm)| {
            ScenarioComparison::between(solution, b).with_resilience(metrics.resilience.score, bm.resilience.score)
        });

        tracing::debug!(
            "指標: 總成本 {:.2}，滿足率 {:.2}%，韌性 {}",
            metrics.total_cost,
            metrics.fill_rate_pct,
            metrics.resilience.score
        );

        let kpis = self.build_kpis(solution, &metrics, comparison.as_ref(), baseline_metrics.as_ref());

        let insights = insight::generate(&InsightContext {
            solution,
            metrics: &metrics,
            kpis: &kpis,
            comparison: comparison.as_ref(),
            baseline_metrics: baseline_metrics.as_ref(),
            thresholds: &self.config.insight_thresholds,
        });

        tracing::info!(
            "情境 {} 的 KPI 計算完成: {} 項 KPI，{} 則洞察，耗時 {:?}",
            solution.scenario_id,
            kpis.len(),
            insights.len(),
            start.elapsed()
        );

        Ok(Analysis {
            scenario_id: solution.scenario_id.clone(),
            kpis,
            insights,
            comparison,
            metrics,
        })
    }

    /// 只計算 KPI
    pub fn kpis(&self, topology: &Topology, solution: &FlowSolution, baseline: Option<&FlowSolution>) -> Result<KpiSet> {
        Ok(self.analyze(topology, solution, baseline)?.kpis)
    }

    fn build_kpis(
        &self,
        solution: &FlowSolution,
        metrics: &NetworkMetrics,
        comparison: Option<&ScenarioComparison>,
        baseline: Option<&NetworkMetrics>,
    ) -> KpiSet {
        let mut set = KpiSet::new();
        set.insert(self.total_cost(solution, metrics, comparison));
        set.insert(self.fill_rate(solution, metrics, baseline));
        set.insert(lead_time(metrics, baseline));
        set.insert(co2(metrics, baseline));
        set.insert(cost_per_unit(solution, metrics, baseline));
        set.insert(resilience(solution, metrics, baseline));
        set
    }

    fn total_cost(&self, solution: &FlowSolution, metrics: &NetworkMetrics, comparison: Option<&ScenarioComparison>) -> Kpi {
        let kpi = Kpi::new(KpiName::TotalCost, metrics.total_cost, format::eur(metrics.total_cost), "EUR")
            .with_driver(cost_driver(solution));

        match comparison {
            Some(cmp) => {
                let delta = cmp.cost_delta();
                let pct = cmp.cost_delta_pct().unwrap_or(0.0);
                let vars = [
                    ("delta_pct", format::pct(pct.abs())),
                    ("delta_abs", format::eur(delta.abs())),
                ];
                kpi.with_benchmark(format!("{}% vs {}", format::signed(pct, 1), cmp.baseline_id))
                    .with_context(apply(&narrative::COST_DELTA_CONTEXT, pct, &vars))
                    .with_impact(apply(&narrative::COST_DELTA_IMPACT, delta, &vars))
                    .with_action(narrative::COST_DELTA_ACTION.select(delta))
                    .with_delta(Some(KpiDelta {
                        absolute: delta,
                        percent: cmp.cost_delta_pct(),
                    }))
                    .with_priority(Some(classify_priority(delta, 0.0, &self.config.insight_thresholds)))
            }
            None => kpi
                .with_benchmark("Reference configuration (no baseline comparison)")
                .with_context("Total annual network cost across production, transport, warehousing and unmet demand")
                .with_impact("Establishes the benchmark for measuring improvement opportunities")
                .with_action(narrative::COST_DELTA_ACTION.select(0.0)),
        }
    }

    fn fill_rate(&self, solution: &FlowSolution, metrics: &NetworkMetrics, baseline: Option<&NetworkMetrics>) -> Kpi {
        let fill = metrics.fill_rate_pct;
        let worst_market = metrics
            .worst_market
            .as_ref()
            .map_or_else(|| "constrained markets".to_string(), |(id, _)| id.clone());

        let driver = if !solution.disabled_plants.is_empty() {
            format!(
                "Plant outage ({}) removing {} of production capacity",
                joined(solution),
                format::pct(metrics.disabled_capacity_share * 100.0)
            )
        } else if let Some((market, _)) = &metrics.worst_market {
            format!("Capacity constraints in specific markets (e.g., {})", market)
        } else {
            "No significant capacity constraints".to_string()
        };

        let (delta, priority) = match baseline {
            Some(base) => {
                let degradation = (base.fill_rate_pct - fill).max(0.0);
                let revenue_delta = metrics.lost_revenue - base.lost_revenue;
                (
                    Some(KpiDelta::points(fill, base.fill_rate_pct)),
                    Some(classify_priority(revenue_delta, degradation, &self.config.insight_thresholds)),
                )
            }
            None => (None, None),
        };

        Kpi::new(KpiName::FillRate, fill, format::pct(fill), "percent")
            .with_benchmark(format!("{}pp vs 100% target", format::signed(fill - 100.0, 1)))
            .with_context(format!(
                "Missing {} of demand = {} units unfulfilled annually",
                format::pct(100.0 - fill),
                format::units(metrics.total_unmet)
            ))
            .with_impact(format!("{} lost revenue from unfulfilled demand", format::eur(metrics.lost_revenue)))
            .with_driver(driver)
            .with_action(apply(&narrative::FILL_RATE_ACTION, fill, &[("worst_market", worst_market)]))
            .with_delta(delta)
            .with_priority(priority)
    }
}

fn apply(table: &RuleTable, value: f64, vars: &[(&str, String)]) -> String {
    tracing::trace!("套用敘述規則 {}（值 {}）", table.name, value);
    table.render(value, vars)
}

fn joined(solution: &FlowSolution) -> String {
    solution.disabled_plants.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// 占比超過門檻的成本組成
fn cost_driver(solution: &FlowSolution) -> String {
    let drivers: Vec<String> = COST_DRIVER_SHARES
        .iter()
        .filter_map(|&(component, threshold)| {
            let share = NetworkMetrics::cost_share(solution, component);
            (share > threshold).then(|| format!("{} ({})", component.label(), format::pct(share * 100.0)))
        })
        .collect();

    if drivers.is_empty() {
        "Balanced cost distribution".to_string()
    } else {
        drivers.join(", ")
    }
}

fn lead_time(metrics: &NetworkMetrics, baseline: Option<&NetworkMetrics>) -> Kpi {
    let days = metrics.avg_lead_time_days;
    let benchmark = match baseline {
        Some(base) => format!("{} days vs baseline", format::signed(days - base.avg_lead_time_days, 1)),
        None => "Volume-weighted across all routed flow".to_string(),
    };

    Kpi::new(KpiName::AvgLeadTime, days, format!("{} days", format::number(days, 1)), "days")
        .with_benchmark(benchmark)
        .with_context(narrative::LEAD_TIME_CONTEXT.select(days))
        .with_impact(format!(
            "{} of routed volume moves by sea",
            format::pct(metrics.sea_volume_share * 100.0)
        ))
        .with_driver(format!(
            "Sea freight {} / road {} of routed volume",
            format::pct(metrics.sea_volume_share * 100.0),
            format::pct((1.0 - metrics.sea_volume_share) * 100.0)
        ))
        .with_action(narrative::LEAD_TIME_ACTION.select(days))
        .with_delta(baseline.map(|b| KpiDelta::between(days, b.avg_lead_time_days)))
}

fn co2(metrics: &NetworkMetrics, baseline: Option<&NetworkMetrics>) -> Kpi {
    let tonnes = metrics.co2_tonnes;
    let ratio = tonnes / CO2_TARGET_TONNES;
    let formatted = if tonnes >= 1000.0 {
        format!("{}K tonnes", format::number(tonnes / 1000.0, 0))
    } else {
        format!("{} tonnes", format::number(tonnes, 1))
    };
    let impact = if tonnes > CO2_TARGET_TONNES {
        format!("{} tonnes above target", format::units(tonnes - CO2_TARGET_TONNES))
    } else {
        format!("{} tonnes headroom below target", format::units(CO2_TARGET_TONNES - tonnes))
    };

    Kpi::new(KpiName::Co2Emissions, tonnes, formatted, "tonnes CO2")
        .with_benchmark(format!(
            "{}% vs sustainability target (40K tonnes)",
            format::signed((ratio - 1.0) * 100.0, 1)
        ))
        .with_context(narrative::CO2_CONTEXT.select(ratio))
        .with_impact(impact)
        .with_driver(format!(
            "Sea {} / road {} of transport emissions",
            format::pct(metrics.sea_co2_share * 100.0),
            format::pct((1.0 - metrics.sea_co2_share) * 100.0)
        ))
        .with_action(narrative::CO2_ACTION.select(ratio))
        .with_delta(baseline.map(|b| KpiDelta::between(tonnes, b.co2_tonnes)))
}

fn cost_per_unit(solution: &FlowSolution, metrics: &NetworkMetrics, baseline: Option<&NetworkMetrics>) -> Kpi {
    let driver = cost_driver(solution);
    let Some(cpu) = metrics.cost_per_unit else {
        return Kpi::new(KpiName::CostPerUnit, 0.0, "n/a", "EUR")
            .with_benchmark("n/a (no demand fulfilled)")
            .with_context("No units delivered in this scenario")
            .with_impact("Cost per unit undefined without fulfilled demand")
            .with_driver(driver)
            .with_action("Restore supply before assessing unit cost");
    };

    let over_budget = cpu - COST_PER_UNIT_BUDGET_EUR;
    let budget_delta = if over_budget >= 0.0 {
        format!("+{}", format::eur_per_unit(over_budget))
    } else {
        format!("-{}", format::eur_per_unit(-over_budget))
    };
    let context = if metrics.avg_revenue_per_unit > 0.0 {
        format!(
            "Supply chain cost = {} of average revenue per unit",
            format::pct(cpu / metrics.avg_revenue_per_unit * 100.0)
        )
    } else {
        "Supply chain cost per fulfilled unit".to_string()
    };

    Kpi::new(KpiName::CostPerUnit, cpu, format::eur_per_unit(cpu), "EUR")
        .with_benchmark(format!("{} vs budget (€0.244)", budget_delta))
        .with_context(context)
        .with_impact(format!(
            "Every €0.01 reduction = {} annual savings",
            format::eur(metrics.fulfilled * 0.01)
        ))
        .with_driver(driver)
        .with_action(narrative::COST_PER_UNIT_ACTION.select(over_budget))
        .with_delta(
            baseline
                .and_then(|b| b.cost_per_unit)
                .map(|base| KpiDelta::between(cpu, base)),
        )
}

fn resilience(solution: &FlowSolution, metrics: &NetworkMetrics, baseline: Option<&NetworkMetrics>) -> Kpi {
    let score = metrics.resilience.score;
    let (largest_id, largest_share) = metrics
        .largest_plant
        .clone()
        .unwrap_or_else(|| ("the largest plant".to_string(), 0.0));

    let (context, driver) = if solution.disabled_plants.is_empty() {
        (
            narrative::RESILIENCE_CONTEXT.select(score).to_string(),
            apply(
                &narrative::CONCENTRATION_DRIVER,
                largest_share,
                &[("share", format::pct(largest_share * 100.0))],
            ),
        )
    } else {
        (
            "Low resilience demonstrated - plant outage causes significant impact".to_string(),
            format!(
                "Single point of failure demonstrated ({} = {} of capacity)",
                joined(solution),
                format::pct(metrics.disabled_capacity_share * 100.0)
            ),
        )
    };

    let impact = match &metrics.largest_plant {
        Some((id, _)) => format!(
            "Loss of {} exposes {} annual revenue",
            id,
            format::eur(metrics.revenue_exposed_largest_plant)
        ),
        None => "No active production capacity".to_string(),
    };

    Kpi::new(
        KpiName::NetworkResilienceScore,
        score,
        format!("{}/100", format::number(score, 0)),
        "score",
    )
    .with_benchmark(format!(
        "{} points vs industry best practice (80/100)",
        format::signed(score - RESILIENCE_BEST_PRACTICE, 0)
    ))
    .with_context(context)
    .with_impact(impact)
    .with_driver(driver)
    .with_action(apply(
        &narrative::RESILIENCE_ACTION,
        score,
        &[("largest_plant", largest_id)],
    ))
    .with_delta(baseline.map(|b| KpiDelta::between(score, b.resilience.score)))
}
