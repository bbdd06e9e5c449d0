//! 網路優化服務（API facade）

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use netopt_core::{FlowSolution, OptimizerConfig, Result, Topology};
use netopt_kpi::{Analysis, KpiEngine};
use netopt_model::LpBackend;
use netopt_scenario::{ScenarioDefinition, ScenarioEngine, BASELINE};
use parking_lot::RwLock;

use crate::payload::{
    ApiResponse, InsightPayload, KpisResponse, LatestFlows, NetworkDataResponse, OptimizeResponse, ScenarioSummary,
    SolutionSummary,
};
use crate::report::{self, Report};

/// 最近求解結果（每個情境保留最新一次的最佳解）
#[derive(Debug, Default)]
struct SolutionCache {
    by_scenario: HashMap<String, Arc<FlowSolution>>,
    latest: Option<String>,
}

/// 網路優化服務
///
/// 拓撲載入後不再變動；各請求可並行呼叫，快取以讀寫鎖保護。
pub struct NetworkOptimizer {
    scenarios: ScenarioEngine,
    kpi: KpiEngine,
    cache: RwLock<SolutionCache>,
}

impl NetworkOptimizer {
    /// 以標準情境目錄建立服務
    pub fn new(topology: Topology, config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        let scenarios = ScenarioEngine::new(Arc::new(topology), config.clone());

        let topology = scenarios.topology();
        tracing::info!(
            "建立網路優化服務: {} 座工廠，{} 個配送中心，{} 個市場，{} 條路線，{} 個情境",
            topology.plants().len(),
            topology.distribution_centers().len(),
            topology.markets().len(),
            topology.routes().len(),
            scenarios.catalog().len()
        );

        Ok(Self {
            scenarios,
            kpi: KpiEngine::new(config),
            cache: RwLock::new(SolutionCache::default()),
        })
    }

    pub fn with_backend(mut self, backend: Arc<dyn LpBackend>) -> Self {
        self.scenarios = self.scenarios.with_backend(backend);
        self
    }

    /// 註冊自訂情境
    pub fn register_scenario(&mut self, definition: ScenarioDefinition) -> Result<()> {
        self.scenarios.register(definition)
    }

    pub fn topology(&self) -> &Arc<Topology> {
        self.scenarios.topology()
    }

    pub fn scenario_engine(&self) -> &ScenarioEngine {
        &self.scenarios
    }

    pub fn kpi_engine(&self) -> &KpiEngine {
        &self.kpi
    }

    /// 列出可用情境
    pub fn list_scenarios(&self) -> Vec<ScenarioSummary> {
        self.scenarios.catalog().list().iter().map(ScenarioSummary::from).collect()
    }

    /// 求解情境並計算 KPI 與洞察
    pub fn optimize(&self, scenario_id: &str) -> ApiResponse<OptimizeResponse> {
        self.try_optimize(scenario_id).into()
    }

    /// 取得情境 KPI（不含洞察）；優先使用快取的解
    pub fn get_kpis(&self, scenario_id: Option<&str>) -> ApiResponse<KpisResponse> {
        let scenario_id = scenario_id.unwrap_or(BASELINE);
        self.try_get_kpis(scenario_id).into()
    }

    /// 拓撲資料與最近一次解的路線流量
    pub fn get_network_data(&self) -> NetworkDataResponse {
        let topology = self.topology();
        let latest_flows = {
            let cache = self.cache.read();
            cache
                .latest
                .as_ref()
                .and_then(|id| cache.by_scenario.get(id))
                .map(|solution| LatestFlows {
                    scenario_id: solution.scenario_id.clone(),
                    flows: solution.flows.iter().filter(|f| f.volume > 0.0).cloned().collect(),
                })
        };

        NetworkDataResponse {
            success: true,
            plants: topology.plants().to_vec(),
            distribution_centers: topology.distribution_centers().to_vec(),
            markets: topology.markets().to_vec(),
            routes: topology.routes().to_vec(),
            latest_flows,
        }
    }

    /// 匯出情境報表（使用快取的解）
    pub fn export_report(&self, scenario_id: &str) -> ApiResponse<Report> {
        self.try_export_report(scenario_id).into()
    }

    /// 取得情境的最佳解，必要時求解並寫入快取
    pub fn solution(&self, scenario_id: &str) -> Result<Arc<FlowSolution>> {
        if let Some(cached) = self.cache.read().by_scenario.get(scenario_id) {
            tracing::debug!("使用快取的解: {}", scenario_id);
            return Ok(Arc::clone(cached));
        }

        let run = self.scenarios.run(scenario_id)?;
        run.flow_solution.ensure_optimal()?;
        let solution = Arc::new(run.flow_solution);

        let mut cache = self.cache.write();
        cache.by_scenario.insert(scenario_id.to_string(), Arc::clone(&solution));
        cache.latest = Some(scenario_id.to_string());
        Ok(solution)
    }

    /// 清除快取
    pub fn clear_cache(&self) {
        let mut cache = self.cache.write();
        cache.by_scenario.clear();
        cache.latest = None;
    }

    fn try_optimize(&self, scenario_id: &str) -> Result<OptimizeResponse> {
        let start = Instant::now();
        // 每次 optimize 都重新求解
        self.cache.write().by_scenario.remove(scenario_id);

        let analysis = self.analyze(scenario_id)?;
        let solution = self.solution(scenario_id)?;

        tracing::info!("optimize({}) 完成，耗時 {:?}", scenario_id, start.elapsed());

        Ok(OptimizeResponse {
            success: true,
            scenario_id: scenario_id.to_string(),
            solution_summary: SolutionSummary::from(solution.as_ref()),
            insights: analysis.insights.iter().map(InsightPayload::from).collect(),
            baseline_id: analysis.comparison.map(|c| c.baseline_id),
            kpis: analysis.kpis,
        })
    }

    fn try_get_kpis(&self, scenario_id: &str) -> Result<KpisResponse> {
        let analysis = self.analyze(scenario_id)?;
        Ok(KpisResponse {
            success: true,
            scenario_id: scenario_id.to_string(),
            kpis: analysis.kpis,
        })
    }

    fn try_export_report(&self, scenario_id: &str) -> Result<Report> {
        let analysis = self.analyze(scenario_id)?;
        report::export_report(scenario_id, &analysis.kpis, &analysis.insights)
    }

    fn analyze(&self, scenario_id: &str) -> Result<Analysis> {
        self.scenarios.catalog().require(scenario_id)?;
        // 先取基準，使最近一次的解為所請求的情境
        let baseline = self.baseline_for(scenario_id);
        let solution = self.solution(scenario_id)?;
        self.kpi.analyze(self.topology(), &solution, baseline.as_deref())
    }

    /// 比較用基準解；基準情境本身或基準求解失敗時為 None
    fn baseline_for(&self, scenario_id: &str) -> Option<Arc<FlowSolution>> {
        if scenario_id == BASELINE || self.scenarios.catalog().get(BASELINE).is_none() {
            return None;
        }
        match self.solution(BASELINE) {
            Ok(solution) => Some(solution),
            Err(err) => {
                tracing::warn!("無法取得基準解，略過比較: {}", err);
                None
            }
        }
    }
}

impl std::fmt::Debug for NetworkOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkOptimizer")
            .field("scenarios", &self.scenarios)
            .field("cached", &self.cache.read().by_scenario.len())
            .finish()
    }
}
