//! 集成測試

use std::sync::Arc;
use std::time::Duration;

use netopt::{
    ApiResponse, DistributionCenter, KpiName, Location, Market, NetworkOptimizer, OptimizerConfig, Plant, Priority,
    Route, ScenarioDefinition, ScenarioSpec, SolveStatus, Topology, TransportMode, BASELINE, COST_OPTIMIZED,
    DISRUPTION,
};
use netopt_model::{default_backend, optimize_network, LinearProgram, LpBackend, SolverOutcome};
use proptest::prelude::*;
use rstest::rstest;

/// 兩廠、兩配送中心、兩市場
fn two_by_two() -> Topology {
    let vienna = Location::new(48.21, 16.37);
    let concord = Location::new(35.41, -80.58);
    Topology::new(
        vec![
            Plant::new("P1", vienna, 100.0, 1.0).with_name("Vienna"),
            Plant::new("P2", concord, 60.0, 1.5).with_name("Concord"),
        ],
        vec![
            DistributionCenter::new("DC1", vienna, 500.0, 1.0, 0.1),
            DistributionCenter::new("DC2", concord, 500.0, 1.0, 0.1),
        ],
        vec![
            Market::new("M1", vienna, 70.0, 3.0),
            Market::new("M2", concord, 50.0, 3.0),
        ],
        vec![
            Route::supply("P1", "DC1", TransportMode::Road, 0.2, 1.0),
            Route::supply("P1", "DC2", TransportMode::Sea, 0.8, 12.0),
            Route::supply("P2", "DC2", TransportMode::Road, 0.2, 1.0),
            Route::supply("P2", "DC1", TransportMode::Sea, 0.8, 12.0),
            Route::delivery("DC1", "M1", TransportMode::Road, 0.1, 1.0),
            Route::delivery("DC1", "M2", TransportMode::Sea, 0.6, 10.0),
            Route::delivery("DC2", "M2", TransportMode::Road, 0.1, 1.0),
            Route::delivery("DC2", "M1", TransportMode::Sea, 0.6, 10.0),
        ],
    )
    .unwrap()
}

fn optimizer() -> NetworkOptimizer {
    NetworkOptimizer::new(two_by_two(), OptimizerConfig::default()).unwrap()
}

#[test]
fn test_list_standard_scenarios() {
    let scenarios = optimizer().list_scenarios();
    let ids: Vec<&str> = scenarios.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec![BASELINE, COST_OPTIMIZED, DISRUPTION]);
    assert!(scenarios.iter().all(|s| !s.name.is_empty() && !s.description.is_empty()));
}

#[test]
fn test_optimize_baseline_without_deltas() {
    let response = optimizer().optimize(BASELINE).success().unwrap();

    assert!(response.success);
    assert_eq!(response.solution_summary.status, SolveStatus::Optimal);
    assert!((response.solution_summary.fill_rate_pct - 100.0).abs() < 1e-6);
    assert!(response.baseline_id.is_none());
    assert_eq!(response.kpis.len(), KpiName::ALL.len());
    assert!(response.kpis.iter().all(|k| k.delta.is_none()));

    let breakdown = response.solution_summary.cost_breakdown;
    assert!((breakdown.total() - response.solution_summary.objective_value).abs() < 1e-6);
    assert!(breakdown.unmet_penalty.abs() < 1e-6);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], true);
    assert!(json["solution_summary"]["cost_breakdown"]["transport_plant_dc"].is_number());
    assert!(json["kpis"]["fill_rate"]["formatted"].is_string());
    assert!(json["kpis"]["fill_rate"].get("delta").is_none());
}

#[test]
fn test_disruption_compared_with_baseline() {
    let optimizer = optimizer();
    let baseline = optimizer.optimize(BASELINE).success().unwrap();
    let disruption = optimizer.optimize(DISRUPTION).success().unwrap();

    assert_eq!(disruption.baseline_id.as_deref(), Some(BASELINE));
    // P1 停用：僅剩 60 單位產能
    assert!((disruption.solution_summary.total_unmet - 60.0).abs() < 1e-6);
    assert!((disruption.solution_summary.fill_rate_pct - 50.0).abs() < 1e-6);
    assert!(disruption.solution_summary.objective_value > baseline.solution_summary.objective_value);

    let fill = disruption.kpis.get(KpiName::FillRate).unwrap();
    assert!((fill.delta.unwrap().absolute + 50.0).abs() < 1e-6);
    assert_eq!(fill.priority, Some(Priority::High));

    let base_resilience = baseline.kpis.value(KpiName::NetworkResilienceScore).unwrap();
    let resilience = disruption.kpis.value(KpiName::NetworkResilienceScore).unwrap();
    assert!(resilience < base_resilience);

    assert!(disruption.insights.iter().any(|i| i.title.contains("P1")));
    for pair in disruption.insights.windows(2) {
        assert!(pair[0].priority.rank() <= pair[1].priority.rank());
    }
}

#[test]
fn test_cost_optimized_matches_baseline_when_full_service_is_cheapest() {
    let optimizer = optimizer();
    let baseline = optimizer.optimize(BASELINE).success().unwrap();
    let cost_optimized = optimizer.optimize(COST_OPTIMIZED).success().unwrap();

    assert!(
        (cost_optimized.solution_summary.objective_value - baseline.solution_summary.objective_value).abs() < 1e-6
    );
    let cost = cost_optimized.kpis.get(KpiName::TotalCost).unwrap();
    assert!(cost.delta.unwrap().absolute.abs() < 1e-6);
}

#[rstest]
#[case("nope", "unknown_scenario")]
#[case("", "unknown_scenario")]
fn test_unknown_scenario_is_structured_error(#[case] id: &str, #[case] kind: &str) {
    let optimizer = optimizer();
    let err = optimizer.optimize(id).failure().unwrap();
    assert_eq!(err.kind(), kind);
    assert!(!err.success);

    let err = optimizer.get_kpis(Some(id)).failure().unwrap();
    assert_eq!(err.kind(), kind);
}

#[test]
fn test_infeasible_fill_floor() {
    let mut optimizer = optimizer();
    optimizer
        .register_scenario(ScenarioDefinition::new(
            "full_service_outage",
            "Full service during outage",
            ScenarioSpec::baseline().with_disabled_plant("P1").with_min_fill_rate(1.0),
        ))
        .unwrap();

    let err = optimizer.optimize("full_service_outage").failure().unwrap();
    assert_eq!(err.kind(), "infeasible");
    assert_eq!(err.error.status, Some(SolveStatus::Infeasible));

    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["status"], "infeasible");
}

#[test]
fn test_register_rejects_unknown_ids() {
    let mut optimizer = optimizer();
    let err = optimizer
        .register_scenario(ScenarioDefinition::new(
            "ghost",
            "Ghost plant",
            ScenarioSpec::baseline().with_disabled_plant("P9"),
        ))
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_override");
}

/// 模擬超時的後端
struct TimedOutBackend;

impl LpBackend for TimedOutBackend {
    fn name(&self) -> &'static str {
        "timed-out"
    }

    fn solve(&self, _program: &LinearProgram, time_limit: Duration) -> SolverOutcome {
        SolverOutcome {
            status: SolveStatus::TimeLimitReached,
            values: None,
            message: Some("deadline".to_string()),
            elapsed: time_limit,
        }
    }
}

#[test]
fn test_timeout_is_surfaced() {
    let optimizer = optimizer().with_backend(Arc::new(TimedOutBackend));
    let err = optimizer.optimize(BASELINE).failure().unwrap();
    assert_eq!(err.kind(), "solver_timeout");
    assert_eq!(err.error.status, Some(SolveStatus::TimeLimitReached));
}

#[test]
fn test_get_kpis_defaults_to_baseline() {
    let optimizer = optimizer();
    let response = optimizer.get_kpis(None).success().unwrap();
    assert_eq!(response.scenario_id, BASELINE);
    assert_eq!(response.kpis.len(), KpiName::ALL.len());

    // 快取的解與 optimize 一致
    let optimized = optimizer.optimize(BASELINE).success().unwrap();
    assert_eq!(
        response.kpis.value(KpiName::TotalCost),
        optimized.kpis.value(KpiName::TotalCost)
    );
}

#[test]
fn test_network_data_exposes_latest_flows() {
    let optimizer = optimizer();
    let before = optimizer.get_network_data();
    assert_eq!(before.plants.len(), 2);
    assert_eq!(before.routes.len(), 8);
    assert!(before.latest_flows.is_none());

    assert!(optimizer.optimize(DISRUPTION).is_success());
    let after = optimizer.get_network_data();
    let latest = after.latest_flows.unwrap();
    assert_eq!(latest.scenario_id, DISRUPTION);
    assert!(latest.flows.iter().all(|f| f.volume > 0.0 && f.origin != "P1"));
}

#[test]
fn test_export_report() {
    let optimizer = optimizer();
    let report = match optimizer.export_report(DISRUPTION) {
        ApiResponse::Success(report) => report,
        ApiResponse::Failure(err) => panic!("export failed: {:?}", err),
    };

    let kpi_lines: Vec<&str> = report.kpi_sheet.lines().collect();
    assert!(kpi_lines[0].starts_with("kpi,value,formatted"));
    assert_eq!(kpi_lines.len(), 1 + KpiName::ALL.len());

    let insight_lines: Vec<&str> = report.insight_sheet.lines().collect();
    assert!(insight_lines[0].starts_with("rank,priority,title"));
    assert!(insight_lines.len() > 1);
}

#[test]
fn test_scenario_runs_are_deterministic() {
    let optimizer = optimizer();
    let runs = optimizer.scenario_engine().run_many(&[BASELINE, DISRUPTION, BASELINE]);
    let ids: Vec<&str> = runs.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec![BASELINE, DISRUPTION, BASELINE]);

    let first = runs[0].1.as_ref().unwrap();
    let third = runs[2].1.as_ref().unwrap();
    assert_eq!(first.flow_solution.objective_value, third.flow_solution.objective_value);
    assert_eq!(first.flow_solution.flows, third.flow_solution.flows);
}

fn random_topology(
    plants: &[(f64, f64)],
    dcs: &[(f64, f64)],
    markets: &[f64],
    supply_costs: &[f64],
    delivery_costs: &[f64],
) -> Topology {
    let loc = Location::new(0.0, 0.0);
    let plant_list = plants
        .iter()
        .enumerate()
        .map(|(i, &(cap, cost))| Plant::new(format!("P{}", i), loc, cap, cost))
        .collect();
    let dc_list = dcs
        .iter()
        .enumerate()
        .map(|(i, &(fixed, var))| DistributionCenter::new(format!("DC{}", i), loc, 1e6, fixed, var))
        .collect();
    let market_list = markets
        .iter()
        .enumerate()
        .map(|(i, &demand)| Market::new(format!("M{}", i), loc, demand, 2.0))
        .collect();

    let mut routes = Vec::new();
    for p in 0..plants.len() {
        for d in 0..dcs.len() {
            let cost = supply_costs[(p * dcs.len() + d) % supply_costs.len()];
            routes.push(Route::supply(format!("P{}", p), format!("DC{}", d), TransportMode::Road, cost, 1.0));
        }
    }
    for d in 0..dcs.len() {
        for m in 0..markets.len() {
            let cost = delivery_costs[(d * markets.len() + m) % delivery_costs.len()];
            routes.push(Route::delivery(format!("DC{}", d), format!("M{}", m), TransportMode::Sea, cost, 5.0));
        }
    }

    Topology::new(plant_list, dc_list, market_list, routes).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_flow_conservation(
        // 路徑成本上限 1.5 + 1.5 + 0.5 + 1.5 < 預設懲罰 5
        plants in prop::collection::vec((0.0f64..200.0, 0.5f64..1.5), 1..=3),
        dcs in prop::collection::vec((0.0f64..10.0, 0.0f64..0.5), 1..=2),
        markets in prop::collection::vec(0.0f64..150.0, 1..=3),
        supply_costs in prop::collection::vec(0.0f64..1.5, 6),
        delivery_costs in prop::collection::vec(0.0f64..1.5, 6),
    ) {
        let topology = random_topology(&plants, &dcs, &markets, &supply_costs, &delivery_costs);
        let config = OptimizerConfig::default();
        let solution = optimize_network(&topology, &ScenarioSpec::baseline(), "prop", &config, &default_backend()).unwrap();
        prop_assert_eq!(solution.status, SolveStatus::Optimal);

        let tol = 1e-5;
        for plant in topology.plants() {
            let produced = solution.production.get(&plant.id).copied().unwrap_or(0.0);
            prop_assert!(produced <= plant.annual_capacity + tol);
        }
        for dc in topology.distribution_centers() {
            let outflow: f64 = solution.flows.iter().filter(|f| f.origin == dc.id).map(|f| f.volume).sum();
            prop_assert!((solution.dc_inflow(&dc.id) - outflow).abs() < tol);
        }
        for market in topology.markets() {
            let unmet = solution.unmet_demand.get(&market.id).copied().unwrap_or(0.0);
            prop_assert!(unmet >= -tol);
            prop_assert!((solution.market_inflow(&market.id) + unmet - market.annual_demand).abs() < tol);
        }
        prop_assert!((solution.cost_breakdown.total() - solution.objective_value).abs() < 1e-6);
        prop_assert!(solution.flows.iter().all(|f| f.volume >= 0.0));

        // 全連通網路：有未滿足需求時產能必然用盡
        if solution.total_unmet() > tol {
            prop_assert!((solution.total_production() - topology.total_capacity()).abs() < 1e-4);
        }
    }
}
