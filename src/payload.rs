//! API 層回應格式
//!
//! 成功與失敗都以可序列化物件回傳；失敗固定為
//! `{success: false, error: {kind, message, status?}}`。

use netopt_core::{
    CostBreakdown, DistributionCenter, FlowSolution, Market, NetoptError, Plant, Route, RouteFlow, SolveStatus,
};
use netopt_kpi::{Insight, KpiSet, Priority};
use netopt_scenario::ScenarioDefinition;
use serde::Serialize;

/// 情境清單項目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub objective: String,
    pub use_case: String,
    pub trade_offs: String,
}

impl From<&ScenarioDefinition> for ScenarioSummary {
    fn from(definition: &ScenarioDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            objective: definition.objective.clone(),
            use_case: definition.use_case.clone(),
            trade_offs: definition.trade_offs.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolutionSummary {
    pub status: SolveStatus,
    pub objective_value: f64,
    pub cost_breakdown: CostBreakdown,
    pub fill_rate_pct: f64,
    pub total_unmet: f64,
    pub solve_time_ms: u64,
}

impl From<&FlowSolution> for SolutionSummary {
    fn from(solution: &FlowSolution) -> Self {
        Self {
            status: solution.status,
            objective_value: solution.objective_value,
            cost_breakdown: solution.cost_breakdown,
            fill_rate_pct: solution.fill_rate_pct(),
            total_unmet: solution.total_unmet(),
            solve_time_ms: solution.solve_time_ms,
        }
    }
}

/// 回應中的洞察（僅 API 需要的欄位）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightPayload {
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub implementation: String,
}

impl From<&Insight> for InsightPayload {
    fn from(insight: &Insight) -> Self {
        Self {
            priority: insight.priority,
            title: insight.title.clone(),
            description: insight.description.clone(),
            impact: insight.impact.clone(),
            implementation: insight.implementation.clone(),
        }
    }
}

/// `optimize` 的成功回應
#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResponse {
    pub success: bool,
    pub scenario_id: String,
    pub solution_summary: SolutionSummary,
    pub kpis: KpiSet,
    pub insights: Vec<InsightPayload>,
    /// 比較所用的基準情境；無基準時省略
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_id: Option<String>,
}

/// `get_kpis` 的成功回應
#[derive(Debug, Clone, Serialize)]
pub struct KpisResponse {
    pub success: bool,
    pub scenario_id: String,
    pub kpis: KpiSet,
}

/// 最近一次求解的路線流量
#[derive(Debug, Clone, Serialize)]
pub struct LatestFlows {
    pub scenario_id: String,
    pub flows: Vec<RouteFlow>,
}

/// `get_network_data` 的回應
#[derive(Debug, Clone, Serialize)]
pub struct NetworkDataResponse {
    pub success: bool,
    pub plants: Vec<Plant>,
    pub distribution_centers: Vec<DistributionCenter>,
    pub markets: Vec<Market>,
    pub routes: Vec<Route>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_flows: Option<LatestFlows>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
    /// 求解狀態（僅在求解已完成但非最佳時提供）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SolveStatus>,
}

/// 結構化錯誤回應
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

impl ErrorResponse {
    pub fn kind(&self) -> &str {
        &self.error.kind
    }
}

impl From<NetoptError> for ErrorResponse {
    fn from(err: NetoptError) -> Self {
        let status = match &err {
            NetoptError::Infeasible { .. } => Some(SolveStatus::Infeasible),
            NetoptError::SolverTimeout { .. } => Some(SolveStatus::TimeLimitReached),
            NetoptError::SolverFailure(_) => Some(SolveStatus::SolverError),
            _ => None,
        };
        Self {
            success: false,
            error: ErrorDetail {
                kind: err.kind().to_string(),
                message: err.to_string(),
                status,
            },
        }
    }
}

/// API 回應：成功酬載或結構化錯誤
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    Success(T),
    Failure(ErrorResponse),
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            ApiResponse::Success(value) => Some(value),
            ApiResponse::Failure(_) => None,
        }
    }

    pub fn failure(self) -> Option<ErrorResponse> {
        match self {
            ApiResponse::Success(_) => None,
            ApiResponse::Failure(err) => Some(err),
        }
    }

    pub fn into_result(self) -> std::result::Result<T, ErrorResponse> {
        match self {
            ApiResponse::Success(value) => Ok(value),
            ApiResponse::Failure(err) => Err(err),
        }
    }
}

impl<T> From<netopt_core::Result<T>> for ApiResponse<T> {
    fn from(result: netopt_core::Result<T>) -> Self {
        match result {
            Ok(value) => ApiResponse::Success(value),
            Err(err) => {
                tracing::warn!("請求失敗 [{}]: {}", err.kind(), err);
                ApiResponse::Failure(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_payload_shape() {
        let response = ApiResponse::<KpisResponse>::from(Err(NetoptError::UnknownScenario("nope".to_string())));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["kind"], "unknown_scenario");
        assert!(json["error"]["message"].as_str().unwrap().contains("nope"));
        assert!(json["error"].get("status").is_none());
    }

    #[test]
    fn test_solver_errors_carry_status() {
        let err: ErrorResponse = NetoptError::Infeasible {
            scenario: "tight".to_string(),
        }
        .into();
        assert_eq!(err.kind(), "infeasible");
        assert_eq!(err.error.status, Some(SolveStatus::Infeasible));

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"]["status"], "infeasible");
    }
}
