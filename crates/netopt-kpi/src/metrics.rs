//! 由流量解推導的網路指標

use netopt_core::{CostComponent, FlowSolution, OptimizerConfig, Plant, ResilienceWeights, Topology, TransportMode};
use serde::Serialize;

/// 韌性分數分解（各項 0.0 ~ 1.0）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResilienceBreakdown {
    pub idle_capacity: f64,
    pub geographic_spread: f64,
    pub diversification: f64,
    /// 0 ~ 100（整數）
    pub score: f64,
}

/// 單一解的衍生指標
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkMetrics {
    pub total_cost: f64,
    pub fill_rate_pct: f64,
    pub fulfilled: f64,
    pub total_unmet: f64,
    /// 依流量加權的平均前置時間（天）
    pub avg_lead_time_days: f64,
    /// 運輸排放（噸 CO2）
    pub co2_tonnes: f64,
    /// 海運占總路線流量比例
    pub sea_volume_share: f64,
    /// 海運占排放比例
    pub sea_co2_share: f64,
    /// 已滿足需求的單位成本；無滿足量時為 None
    pub cost_per_unit: Option<f64>,
    pub resilience: ResilienceBreakdown,
    /// 未滿足需求的營收損失
    pub lost_revenue: f64,
    /// 需求加權的平均單位營收
    pub avg_revenue_per_unit: f64,
    /// 啟用工廠中產能最大者及其產能占比
    pub largest_plant: Option<(String, f64)>,
    /// 最大工廠產出對應的營收曝險
    pub revenue_exposed_largest_plant: f64,
    /// 未滿足量最大的市場
    pub worst_market: Option<(String, f64)>,
    /// 停用工廠占總產能比例
    pub disabled_capacity_share: f64,
}

impl NetworkMetrics {
    pub fn compute(topology: &Topology, solution: &FlowSolution, config: &OptimizerConfig) -> Self {
        let (avg_lead_time_days, sea_volume_share) = lead_time_and_sea_share(topology, solution);
        let (co2_kg, sea_co2_kg) = co2_kg(topology, solution, config);

        let fulfilled = solution.fulfilled_demand();
        let total_demand = topology.total_demand();
        let total_revenue: f64 = topology
            .markets()
            .iter()
            .map(|m| m.annual_demand * m.revenue_per_unit)
            .sum();
        let avg_revenue_per_unit = if total_demand > 0.0 {
            total_revenue / total_demand
        } else {
            0.0
        };

        let lost_revenue = topology
            .markets()
            .iter()
            .map(|m| solution.unmet_demand.get(&m.id).copied().unwrap_or(0.0) * m.revenue_per_unit)
            .sum();

        let active_capacity: f64 = active_plants(topology, solution).map(|p| p.annual_capacity).sum();
        let largest = active_plants(topology, solution).fold(None, |best: Option<&Plant>, p| match best {
            Some(b) if b.annual_capacity >= p.annual_capacity => Some(b),
            _ => Some(p),
        });
        let largest_plant = largest.map(|p| {
            let share = if active_capacity > 0.0 {
                p.annual_capacity / active_capacity
            } else {
                0.0
            };
            (p.id.clone(), share)
        });
        let revenue_exposed_largest_plant = largest
            .and_then(|p| solution.production.get(&p.id))
            .map_or(0.0, |produced| produced * avg_revenue_per_unit);

        let worst_market = solution
            .unmet_demand
            .iter()
            .filter(|(_, &unmet)| unmet > 0.0)
            .fold(None, |worst: Option<(&String, f64)>, (id, &unmet)| match worst {
                Some((_, w)) if w >= unmet => worst,
                _ => Some((id, unmet)),
            })
            .map(|(id, unmet)| (id.clone(), unmet));

        let total_capacity = topology.total_capacity();
        let disabled_capacity: f64 = solution
            .disabled_plants
            .iter()
            .filter_map(|id| topology.plant(id))
            .map(|p| p.annual_capacity)
            .sum();

        Self {
            total_cost: solution.objective_value,
            fill_rate_pct: solution.fill_rate_pct(),
            fulfilled,
            total_unmet: solution.total_unmet(),
            avg_lead_time_days,
            co2_tonnes: co2_kg / 1000.0,
            sea_volume_share,
            sea_co2_share: if co2_kg > 0.0 { sea_co2_kg / co2_kg } else { 0.0 },
            cost_per_unit: (fulfilled > 0.0).then(|| solution.objective_value / fulfilled),
            resilience: resilience(topology, solution, &config.resilience),
            lost_revenue,
            avg_revenue_per_unit,
            largest_plant,
            revenue_exposed_largest_plant,
            worst_market,
            disabled_capacity_share: if total_capacity > 0.0 {
                disabled_capacity / total_capacity
            } else {
                0.0
            },
        }
    }

    /// 成本組成占總成本比例
    pub fn cost_share(solution: &FlowSolution, component: CostComponent) -> f64 {
        let total = solution.cost_breakdown.total();
        if total > 0.0 {
            solution.cost_breakdown.get(component) / total
        } else {
            0.0
        }
    }
}

fn active_plants<'t>(
    topology: &'t Topology,
    solution: &'t FlowSolution,
) -> impl Iterator<Item = &'t Plant> + 't {
    topology
        .plants()
        .iter()
        .filter(move |p| p.active && !solution.disabled_plants.contains(&p.id))
}

/// 加權平均前置時間與海運流量占比（兩類路線皆計入）
fn lead_time_and_sea_share(topology: &Topology, solution: &FlowSolution) -> (f64, f64) {
    let mut volume = 0.0;
    let mut weighted = 0.0;
    let mut sea = 0.0;

    for flow in solution.flows.iter().filter(|f| f.volume > 0.0) {
        if let Some(route) = topology.route(&flow.origin, &flow.destination) {
            volume += flow.volume;
            weighted += flow.volume * route.lead_time_days;
            if route.mode == TransportMode::Sea {
                sea += flow.volume;
            }
        }
    }

    if volume > 0.0 {
        (weighted / volume, sea / volume)
    } else {
        (0.0, 0.0)
    }
}

/// 運輸排放（kg）；路線有自訂係數時優先使用
fn co2_kg(topology: &Topology, solution: &FlowSolution, config: &OptimizerConfig) -> (f64, f64) {
    let mut total = 0.0;
    let mut sea = 0.0;

    for flow in &solution.flows {
        if let Some(route) = topology.route(&flow.origin, &flow.destination) {
            let factor = route
                .co2_kg_per_unit
                .unwrap_or_else(|| config.emission_factors.factor(route.mode));
            let kg = flow.volume * factor;
            total += kg;
            if route.mode == TransportMode::Sea {
                sea += kg;
            }
        }
    }

    (total, sea)
}

/// 判定工廠滿載的相對容差
const IDLE_TOLERANCE: f64 = 1e-6;

/// 韌性分數：閒置產能工廠數、地理分散度、產能分散度的加權和 × 100
pub fn resilience(topology: &Topology, solution: &FlowSolution, weights: &ResilienceWeights) -> ResilienceBreakdown {
    let active: Vec<_> = active_plants(topology, solution).collect();

    let idle_plants = active
        .iter()
        .filter(|p| {
            let produced = solution.production.get(&p.id).copied().unwrap_or(0.0);
            p.annual_capacity - produced > IDLE_TOLERANCE * p.annual_capacity.max(1.0)
        })
        .count();
    let idle_capacity = if weights.backup_plant_target > 0 {
        (idle_plants as f64 / f64::from(weights.backup_plant_target)).min(1.0)
    } else {
        1.0
    };

    let mut pair_distance = 0.0;
    let mut pairs = 0usize;
    for (i, a) in active.iter().enumerate() {
        for b in &active[i + 1..] {
            pair_distance += a.location.distance_km(&b.location);
            pairs += 1;
        }
    }
    let geographic_spread = if pairs > 0 && weights.reference_spread_km > 0.0 {
        (pair_distance / pairs as f64 / weights.reference_spread_km).min(1.0)
    } else {
        0.0
    };

    let total_capacity: f64 = active.iter().map(|p| p.annual_capacity).sum();
    let largest = active.iter().map(|p| p.annual_capacity).fold(0.0, f64::max);
    let diversification = if total_capacity > 0.0 {
        1.0 - largest / total_capacity
    } else {
        0.0
    };

    let raw = weights.idle_capacity * idle_capacity
        + weights.geographic_spread * geographic_spread
        + weights.diversification * diversification;

    ResilienceBreakdown {
        idle_capacity,
        geographic_spread,
        diversification,
        score: (raw * 100.0).round().clamp(0.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netopt_core::{DistributionCenter, Location, Market, Route, ScenarioSpec};
    use netopt_model::{default_backend, optimize_network};

    fn topology() -> Topology {
        let vienna = Location::new(48.21, 16.37);
        let concord = Location::new(35.41, -80.58);
        Topology::new(
            vec![
                Plant::new("P1", vienna, 100.0, 1.0),
                Plant::new("P2", concord, 100.0, 1.0),
            ],
            vec![DistributionCenter::new("DC1", vienna, 1000.0, 0.0, 0.0)],
            vec![Market::new("M1", vienna, 120.0, 2.0)],
            vec![
                Route::supply("P1", "DC1", TransportMode::Road, 0.1, 1.0),
                Route::supply("P2", "DC1", TransportMode::Sea, 0.3, 10.0).with_co2_kg_per_unit(1.0),
                Route::delivery("DC1", "M1", TransportMode::Road, 0.1, 2.0),
            ],
        )
        .unwrap()
    }

    fn solve(topology: &Topology, spec: &ScenarioSpec) -> FlowSolution {
        optimize_network(topology, spec, "t", &OptimizerConfig::default(), &default_backend()).unwrap()
    }

    #[test]
    fn test_lead_time_and_co2() {
        let topology = topology();
        let solution = solve(&topology, &ScenarioSpec::baseline());
        let metrics = NetworkMetrics::compute(&topology, &solution, &OptimizerConfig::default());

        // P1 100 (1 天) + P2 20 (10 天) + 配送 120 (2 天)
        let expected_lead = (100.0 * 1.0 + 20.0 * 10.0 + 120.0 * 2.0) / 240.0;
        assert!((metrics.avg_lead_time_days - expected_lead).abs() < 1e-6);
        assert!((metrics.sea_volume_share - 20.0 / 240.0).abs() < 1e-6);

        // road 0.05 × 220 + 自訂 1.0 × 20
        let expected_kg = 0.05 * 220.0 + 20.0;
        assert!((metrics.co2_tonnes - expected_kg / 1000.0).abs() < 1e-9);
        assert!((metrics.cost_per_unit.unwrap() - solution.objective_value / 120.0).abs() < 1e-9);
        assert_eq!(metrics.lost_revenue, 0.0);
        assert!(metrics.worst_market.is_none());
    }

    #[test]
    fn test_resilience_components() {
        let topology = topology();
        let solution = solve(&topology, &ScenarioSpec::baseline());
        let r = resilience(&topology, &solution, &ResilienceWeights::default());

        // P1 滿載、P2 有閒置；兩廠相距超過 5000 公里，產能各半
        assert!((r.idle_capacity - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(r.geographic_spread, 1.0);
        assert!((r.diversification - 0.5).abs() < 1e-9);
        assert_eq!(r.score, 58.0);
    }

    #[test]
    fn test_disruption_lowers_resilience() {
        let topology = topology();
        let baseline = solve(&topology, &ScenarioSpec::baseline());
        let disrupted = solve(&topology, &ScenarioSpec::baseline().with_disabled_plant("P1"));
        let weights = ResilienceWeights::default();

        let base_score = resilience(&topology, &baseline, &weights).score;
        let disrupted_score = resilience(&topology, &disrupted, &weights).score;
        assert!(disrupted_score < base_score);

        let metrics = NetworkMetrics::compute(&topology, &disrupted, &OptimizerConfig::default());
        assert_eq!(metrics.disabled_capacity_share, 0.5);
        assert_eq!(metrics.worst_market, Some(("M1".to_string(), 20.0)));
        assert!((metrics.lost_revenue - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_fulfilled_demand() {
        let topology = topology();
        let spec = ScenarioSpec::baseline().with_disabled_plant("P1").with_disabled_plant("P2");
        let solution = solve(&topology, &spec);
        let metrics = NetworkMetrics::compute(&topology, &solution, &OptimizerConfig::default());

        assert!(metrics.cost_per_unit.is_none());
        assert_eq!(metrics.avg_lead_time_days, 0.0);
        assert_eq!(metrics.resilience.score, 0.0);
        assert!(metrics.largest_plant.is_none());
    }
}
