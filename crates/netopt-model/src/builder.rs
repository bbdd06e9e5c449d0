//! 網路模型建構器
//!
//! 將拓撲與情境參數轉換為 [`LinearProgram`]：
//! - 每條合格路線一個流量變數，每個市場一個未滿足需求變數
//! - 工廠產能、配送中心流量守恆、市場需求、（選用）最低滿足率
//!
//! 求解後依變數值重新計算成本分解，目標值定義為各組成合計。

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::{Duration, Instant};

use chrono::Utc;
use netopt_core::{
    CostBreakdown, CostMultipliers, FlowSolution, NetoptError, OptimizerConfig, Result, RouteClass, RouteFlow,
    ScenarioSpec, SolveStatus, Topology,
};
use uuid::Uuid;

use crate::backend::LpBackend;
use crate::lp::{ColumnId, LinearProgram, RowSense};

/// 已建構、待求解的網路模型
#[derive(Debug, Clone)]
pub struct NetworkModel<'a> {
    topology: &'a Topology,
    scenario_id: String,
    spec: ScenarioSpec,
    penalty_per_unit: f64,
    months_per_year: f64,
    tolerance: f64,
    time_limit: Duration,
    program: LinearProgram,
    /// 與 `topology.routes()` 同序
    route_columns: Vec<ColumnId>,
    /// 與 `topology.markets()` 同序
    unmet_columns: Vec<ColumnId>,
}

impl<'a> NetworkModel<'a> {
    /// 建構模型；情境參數引用未知ID時立即失敗
    pub fn build(
        topology: &'a Topology,
        spec: &ScenarioSpec,
        config: &OptimizerConfig,
        scenario_id: impl Into<String>,
    ) -> Result<Self> {
        config.validate()?;
        spec.validate(topology)?;

        let scenario_id = scenario_id.into();
        let m = spec.cost_multipliers;
        let disabled_plants = spec.effective_disabled_plants(topology);
        let penalty_per_unit = config.unmet_penalty_per_unit * m.unmet_penalty;
        let months_per_year = f64::from(config.months_per_year);

        tracing::debug!(
            "建構情境 {} 的模型（停用工廠 {:?}，停用配送中心 {:?}）",
            scenario_id,
            disabled_plants,
            spec.disabled_dcs
        );

        let capacity_overrides: HashMap<(&str, &str), f64> = spec
            .route_capacities
            .iter()
            .map(|c| ((c.origin.as_str(), c.destination.as_str()), c.capacity))
            .collect();

        let mut program = LinearProgram::new(scenario_id.clone());

        // 步驟1: 路線流量變數
        let mut plant_out: HashMap<&str, Vec<(ColumnId, f64)>> = HashMap::new();
        let mut dc_in: HashMap<&str, Vec<(ColumnId, f64)>> = HashMap::new();
        let mut dc_out: HashMap<&str, Vec<(ColumnId, f64)>> = HashMap::new();
        let mut market_in: HashMap<&str, Vec<(ColumnId, f64)>> = HashMap::new();
        let mut route_columns = Vec::with_capacity(topology.routes().len());
        let mut unit_costs = Vec::with_capacity(topology.routes().len());

        for route in topology.routes() {
            let cost = route_unit_cost(topology, route, &m)?;
            unit_costs.push(cost);
            let upper = capacity_overrides
                .get(&(route.origin.as_str(), route.destination.as_str()))
                .copied();
            let col = program.add_column(format!("flow[{}]", route.key()), cost, upper);
            route_columns.push(col);

            match route.class {
                RouteClass::PlantToDc => {
                    plant_out.entry(route.origin.as_str()).or_default().push((col, 1.0));
                    dc_in.entry(route.destination.as_str()).or_default().push((col, 1.0));
                }
                RouteClass::DcToMarket => {
                    dc_out.entry(route.origin.as_str()).or_default().push((col, 1.0));
                    market_in.entry(route.destination.as_str()).or_default().push((col, 1.0));
                }
            }
        }

        ensure_penalty_dominates(topology, spec, &disabled_plants, &unit_costs, penalty_per_unit)?;

        // 步驟2: 未滿足需求變數（上限為需求本身）
        let unmet_columns: Vec<ColumnId> = topology
            .markets()
            .iter()
            .map(|market| {
                program.add_column(
                    format!("unmet[{}]", market.id),
                    penalty_per_unit,
                    Some(market.annual_demand),
                )
            })
            .collect();

        // 步驟3: 工廠產能
        for plant in topology.plants() {
            let rhs = if disabled_plants.contains(&plant.id) {
                0.0
            } else {
                plant.annual_capacity
            };
            let terms = plant_out.remove(plant.id.as_str()).unwrap_or_default();
            program.add_row(format!("capacity[{}]", plant.id), terms, RowSense::Le, rhs);
        }

        // 步驟4: 配送中心流量守恆與停用
        for dc in topology.distribution_centers() {
            let inflow = dc_in.remove(dc.id.as_str()).unwrap_or_default();
            let outflow = dc_out.remove(dc.id.as_str()).unwrap_or_default();

            if spec.disabled_dcs.contains(&dc.id) {
                program.add_row(format!("disabled[{}]", dc.id), inflow.clone(), RowSense::Le, 0.0);
            }

            let mut terms = inflow;
            terms.extend(outflow.into_iter().map(|(col, _)| (col, -1.0)));
            program.add_row(format!("balance[{}]", dc.id), terms, RowSense::Eq, 0.0);
        }

        // 步驟5: 市場需求（等式）
        for (market, &unmet) in topology.markets().iter().zip(&unmet_columns) {
            let mut terms = market_in.remove(market.id.as_str()).unwrap_or_default();
            terms.push((unmet, 1.0));
            program.add_row(format!("demand[{}]", market.id), terms, RowSense::Eq, market.annual_demand);
        }

        // 步驟6: 最低滿足率 ⇔ Σ未滿足 ≤ (1 - f) × 總需求
        if let Some(fill_rate) = spec.min_fill_rate {
            let terms = unmet_columns.iter().map(|&col| (col, 1.0)).collect();
            let rhs = (1.0 - fill_rate) * topology.total_demand();
            program.add_row("min_fill_rate", terms, RowSense::Le, rhs);
        }

        // 配送中心固定成本：不論是否有流量，一律計入
        program.objective_offset = fixed_warehousing_cost(topology, months_per_year, &m);

        tracing::debug!(
            "模型建構完成: {} 個變數, {} 條約束",
            program.columns.len(),
            program.rows.len()
        );

        Ok(Self {
            topology,
            scenario_id,
            spec: spec.clone(),
            penalty_per_unit,
            months_per_year,
            tolerance: config.flow_tolerance,
            time_limit: config.time_limit(),
            program,
            route_columns,
            unmet_columns,
        })
    }

    pub fn scenario_id(&self) -> &str {
        &self.scenario_id
    }

    /// 底層線性規劃
    pub fn program(&self) -> &LinearProgram {
        &self.program
    }

    /// 求解並提取流量解
    ///
    /// 非最佳狀態但有變數值時仍回傳解（標記該狀態）；
    /// 完全沒有可用解時回傳對應錯誤。
    pub fn solve(&self, backend: &dyn LpBackend) -> Result<FlowSolution> {
        let start = Instant::now();
        tracing::info!(
            "開始求解情境 {}（後端 {}，時間上限 {:?}）",
            self.scenario_id,
            backend.name(),
            self.time_limit
        );

        let outcome = backend.solve(&self.program, self.time_limit);
        let message = outcome.message.unwrap_or_default();

        let values = match outcome.values {
            Some(values) if values.len() == self.program.columns.len() => values,
            Some(values) => {
                return Err(NetoptError::SolverFailure(format!(
                    "求解器回傳 {} 個變數值，模型有 {} 個變數",
                    values.len(),
                    self.program.columns.len()
                )))
            }
            None => {
                tracing::warn!("情境 {} 求解失敗: {} ({})", self.scenario_id, outcome.status.as_str(), message);
                return Err(match outcome.status {
                    SolveStatus::Infeasible => NetoptError::Infeasible {
                        scenario: self.scenario_id.clone(),
                    },
                    SolveStatus::TimeLimitReached => NetoptError::SolverTimeout {
                        scenario: self.scenario_id.clone(),
                    },
                    SolveStatus::Optimal | SolveStatus::SolverError => NetoptError::SolverFailure(message),
                });
            }
        };

        if !outcome.status.is_optimal() {
            tracing::warn!(
                "情境 {} 未達最佳解（{}），回傳目前可用的分配",
                self.scenario_id,
                outcome.status.as_str()
            );
        }

        let solution = self.extract(&values, outcome.status, start.elapsed());

        tracing::info!(
            "情境 {} 求解完成: 目標值 {:.2}，滿足率 {:.2}%，耗時 {:?}",
            self.scenario_id,
            solution.objective_value,
            solution.fill_rate_pct(),
            start.elapsed()
        );

        Ok(solution)
    }

    fn snap(&self, value: f64) -> f64 {
        if value < self.tolerance {
            0.0
        } else {
            value
        }
    }

    fn extract(&self, values: &[f64], status: SolveStatus, elapsed: Duration) -> FlowSolution {
        let topology = self.topology;
        let m = self.spec.cost_multipliers;

        let mut breakdown = CostBreakdown {
            warehousing: fixed_warehousing_cost(topology, self.months_per_year, &m),
            ..CostBreakdown::default()
        };
        let mut production: BTreeMap<String, f64> = topology.plants().iter().map(|p| (p.id.clone(), 0.0)).collect();
        let mut dc_throughput: BTreeMap<String, f64> = topology
            .distribution_centers()
            .iter()
            .map(|dc| (dc.id.clone(), 0.0))
            .collect();
        let mut flows = Vec::with_capacity(self.route_columns.len());

        for (route, col) in topology.routes().iter().zip(&self.route_columns) {
            let volume = self.snap(values[col.0]);

            match route.class {
                RouteClass::PlantToDc => {
                    let plant_cost = topology.plant(&route.origin).map_or(0.0, |p| p.unit_cost);
                    breakdown.production += volume * plant_cost * m.production;
                    breakdown.transport_plant_dc += volume * route.unit_cost * m.transport_plant_dc;
                    *production.entry(route.origin.clone()).or_insert(0.0) += volume;
                }
                RouteClass::DcToMarket => {
                    let variable_cost = topology
                        .distribution_center(&route.origin)
                        .map_or(0.0, |dc| dc.variable_unit_cost);
                    breakdown.transport_dc_market += volume * route.unit_cost * m.transport_dc_market;
                    breakdown.warehousing += volume * variable_cost * m.warehousing;
                    *dc_throughput.entry(route.origin.clone()).or_insert(0.0) += volume;
                }
            }

            flows.push(RouteFlow {
                origin: route.origin.clone(),
                destination: route.destination.clone(),
                class: route.class,
                volume,
            });
        }

        let mut unmet_demand = BTreeMap::new();
        for (market, col) in topology.markets().iter().zip(&self.unmet_columns) {
            let unmet = self.snap(values[col.0]);
            breakdown.unmet_penalty += unmet * self.penalty_per_unit;
            unmet_demand.insert(market.id.clone(), unmet);
        }

        FlowSolution {
            run_id: Uuid::new_v4(),
            scenario_id: self.scenario_id.clone(),
            status,
            objective_value: breakdown.total(),
            cost_breakdown: breakdown,
            flows,
            production,
            dc_throughput,
            unmet_demand,
            total_demand: topology.total_demand(),
            disabled_plants: self.spec.effective_disabled_plants(topology),
            solve_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            solved_at: Utc::now(),
        }
    }
}

/// 路線變數的單位成本（含生產或倉儲變動成本）
fn route_unit_cost(topology: &Topology, route: &netopt_core::Route, m: &CostMultipliers) -> Result<f64> {
    match route.class {
        RouteClass::PlantToDc => {
            let plant = topology
                .plant(&route.origin)
                .ok_or_else(|| NetoptError::UnknownPlant(route.origin.clone()))?;
            Ok(plant.unit_cost * m.production + route.unit_cost * m.transport_plant_dc)
        }
        RouteClass::DcToMarket => {
            let dc = topology
                .distribution_center(&route.origin)
                .ok_or_else(|| NetoptError::UnknownDistributionCenter(route.origin.clone()))?;
            Ok(route.unit_cost * m.transport_dc_market + dc.variable_unit_cost * m.warehousing)
        }
    }
}

/// 每條可用「工廠 → 配送中心 → 市場」路徑的單位成本都必須低於未滿足懲罰，
/// 否則求解器會寧可放棄需求而閒置產能
fn ensure_penalty_dominates(
    topology: &Topology,
    spec: &ScenarioSpec,
    disabled_plants: &BTreeSet<String>,
    unit_costs: &[f64],
    penalty_per_unit: f64,
) -> Result<()> {
    let mut inbound: HashMap<&str, (&str, f64)> = HashMap::new();
    for (route, &cost) in topology.routes().iter().zip(unit_costs) {
        if route.class != RouteClass::PlantToDc
            || disabled_plants.contains(&route.origin)
            || spec.disabled_dcs.contains(&route.destination)
        {
            continue;
        }
        let entry = inbound.entry(route.destination.as_str()).or_insert((route.origin.as_str(), cost));
        if cost > entry.1 {
            *entry = (route.origin.as_str(), cost);
        }
    }

    let worst = topology
        .routes()
        .iter()
        .zip(unit_costs)
        .filter(|(route, _)| route.class == RouteClass::DcToMarket)
        .filter_map(|(route, &cost)| {
            inbound
                .get(route.origin.as_str())
                .map(|&(plant, supply_cost)| (plant, route, supply_cost + cost))
        })
        .max_by(|a, b| a.2.total_cmp(&b.2));

    match worst {
        Some((plant, route, path_cost)) if path_cost >= penalty_per_unit => {
            let message = format!(
                "路徑 {} -> {} -> {} 單位成本 {:.4} 不低於未滿足懲罰 {:.4}",
                plant, route.origin, route.destination, path_cost, penalty_per_unit
            );
            if spec.cost_multipliers == CostMultipliers::default() {
                Err(NetoptError::InvalidConfig(message))
            } else {
                Err(NetoptError::InvalidOverride(message))
            }
        }
        _ => Ok(()),
    }
}

/// 配送中心固定成本（年化）
fn fixed_warehousing_cost(topology: &Topology, months_per_year: f64, m: &CostMultipliers) -> f64 {
    topology
        .distribution_centers()
        .iter()
        .map(|dc| dc.fixed_monthly_cost * months_per_year * m.warehousing)
        .sum()
}

/// 純函數介面：(拓撲, 情境參數) → 流量解
pub fn optimize_network(
    topology: &Topology,
    spec: &ScenarioSpec,
    scenario_id: &str,
    config: &OptimizerConfig,
    backend: &dyn LpBackend,
) -> Result<FlowSolution> {
    NetworkModel::build(topology, spec, config, scenario_id)?.solve(backend)
}
