//! 情境引擎：情境ID → 參數覆寫 → 建模求解 → 結果封裝

use std::sync::Arc;
use std::time::Instant;

use netopt_core::{FlowSolution, OptimizerConfig, Result, ScenarioSpec, Topology};
use netopt_model::{default_backend, optimize_network, LpBackend};
use rayon::prelude::*;
use serde::Serialize;

use crate::catalog::{ScenarioCatalog, ScenarioDefinition};

/// 單一情境的求解結果
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRun {
    pub scenario_id: String,
    pub flow_solution: FlowSolution,
}

/// 情境引擎
///
/// 拓撲以 `Arc` 共享且不可變，多個情境可同時求解。
#[derive(Clone)]
pub struct ScenarioEngine {
    topology: Arc<Topology>,
    catalog: ScenarioCatalog,
    config: OptimizerConfig,
    backend: Arc<dyn LpBackend>,
}

impl ScenarioEngine {
    /// 以標準情境目錄與預設後端建立引擎
    pub fn new(topology: Arc<Topology>, config: OptimizerConfig) -> Self {
        let catalog = ScenarioCatalog::standard(&topology);
        Self {
            topology,
            catalog,
            config,
            backend: Arc::new(default_backend()),
        }
    }

    /// 建構器模式：替換求解後端
    pub fn with_backend(mut self, backend: Arc<dyn LpBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// 建構器模式：替換情境目錄
    pub fn with_catalog(mut self, catalog: ScenarioCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// 註冊自訂情境
    pub fn register(&mut self, definition: ScenarioDefinition) -> Result<()> {
        definition.spec.validate(&self.topology)?;
        self.catalog.register(definition)
    }

    /// 執行目錄中的情境
    pub fn run(&self, scenario_id: &str) -> Result<ScenarioRun> {
        let definition = self.catalog.require(scenario_id)?;
        self.run_spec(&definition.id, &definition.spec)
    }

    /// 以任意參數覆寫執行（不需註冊）
    pub fn run_spec(&self, scenario_id: &str, spec: &ScenarioSpec) -> Result<ScenarioRun> {
        let start = Instant::now();
        tracing::info!("執行情境: {}", scenario_id);

        let flow_solution = optimize_network(&self.topology, spec, scenario_id, &self.config, self.backend.as_ref())?;

        tracing::info!("情境 {} 完成，耗時: {:?}", scenario_id, start.elapsed());

        Ok(ScenarioRun {
            scenario_id: scenario_id.to_string(),
            flow_solution,
        })
    }

    /// 並行執行多個情境，結果順序與輸入相同
    pub fn run_many(&self, scenario_ids: &[&str]) -> Vec<(String, Result<ScenarioRun>)> {
        tracing::info!("並行執行 {} 個情境", scenario_ids.len());
        scenario_ids
            .par_iter()
            .map(|&id| (id.to_string(), self.run(id)))
            .collect()
    }

    /// 並行執行目錄中的全部情境
    pub fn run_all(&self) -> Vec<(String, Result<ScenarioRun>)> {
        let ids: Vec<&str> = self.catalog.ids().collect();
        self.run_many(&ids)
    }
}

impl std::fmt::Debug for ScenarioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioEngine")
            .field("scenarios", &self.catalog.ids().collect::<Vec<_>>())
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BASELINE, COST_OPTIMIZED, DISRUPTION};
    use netopt_core::{DistributionCenter, Location, Market, NetoptError, Plant, Route, SolveStatus, TransportMode};
    use rstest::rstest;

    fn engine() -> ScenarioEngine {
        let loc = Location::new(48.2, 16.4);
        let topology = Topology::new(
            vec![
                Plant::new("P1", loc, 100.0, 1.0),
                Plant::new("P2", Location::new(35.4, -80.6), 40.0, 1.2),
            ],
            vec![DistributionCenter::new("DC1", loc, 1000.0, 0.0, 0.0)],
            vec![Market::new("M1", loc, 120.0, 2.5)],
            vec![
                Route::supply("P1", "DC1", TransportMode::Road, 0.5, 1.0),
                Route::supply("P2", "DC1", TransportMode::Sea, 0.5, 9.0),
                Route::delivery("DC1", "M1", TransportMode::Road, 0.5, 2.0),
            ],
        )
        .unwrap();
        ScenarioEngine::new(Arc::new(topology), OptimizerConfig::default())
    }

    #[test]
    fn test_run_baseline() {
        let run = engine().run(BASELINE).unwrap();

        assert_eq!(run.scenario_id, BASELINE);
        assert_eq!(run.flow_solution.status, SolveStatus::Optimal);
        assert!(run.flow_solution.total_unmet().abs() < 1e-6);
    }

    #[test]
    fn test_run_unknown_scenario() {
        let err = engine().run("mars_colony").unwrap_err();
        assert!(matches!(err, NetoptError::UnknownScenario(id) if id == "mars_colony"));
    }

    #[test]
    fn test_disruption_disables_largest_plant() {
        let run = engine().run(DISRUPTION).unwrap();
        let solution = &run.flow_solution;

        assert!(solution.disabled_plants.contains("P1"));
        assert_eq!(solution.production["P1"], 0.0);
        assert!((solution.total_unmet() - 80.0).abs() < 1e-6);
    }

    #[rstest]
    #[case(&[DISRUPTION, BASELINE, "nope", COST_OPTIMIZED], &[true, true, false, true])]
    #[case(&[BASELINE, DISRUPTION], &[true, true])]
    #[case(&["nope", BASELINE, "nope"], &[false, true, false])]
    fn test_run_many_preserves_order(#[case] ids: &[&str], #[case] succeeded: &[bool]) {
        let results = engine().run_many(ids);

        let returned: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(returned, ids);
        let ok: Vec<bool> = results.iter().map(|(_, run)| run.is_ok()).collect();
        assert_eq!(ok, succeeded);
    }

    #[test]
    fn test_register_rejects_unknown_ids() {
        let mut engine = engine();
        let bad = ScenarioDefinition::new("bad", "Bad", ScenarioSpec::baseline().with_disabled_plant("P7"));
        assert_eq!(engine.register(bad).unwrap_err().kind(), "invalid_override");

        let good = ScenarioDefinition::new("no_p2", "No P2", ScenarioSpec::baseline().with_disabled_plant("P2"));
        engine.register(good).unwrap();
        let run = engine.run("no_p2").unwrap();
        assert_eq!(run.flow_solution.production["P2"], 0.0);
    }
}
