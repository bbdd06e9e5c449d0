//! 洞察規則與優先級
//!
//! 規則依目錄順序掃描，每條觸發的規則產生一則洞察；
//! 優先級只依金額影響與服務衰退百分點決定。

use netopt_core::{FlowSolution, InsightThresholds};
use netopt_scenario::ScenarioComparison;
use serde::Serialize;

use crate::format;
use crate::kpi::{KpiName, KpiSet};
use crate::metrics::NetworkMetrics;

/// 洞察優先級
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// 排序用：High = 0
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// 依金額影響（EUR）與服務衰退（百分點）分級
pub fn classify_priority(impact_eur: f64, service_impact_pp: f64, thresholds: &InsightThresholds) -> Priority {
    let eur = impact_eur.abs();
    let pp = service_impact_pp.abs();
    if eur > thresholds.high_eur || pp > thresholds.high_service_pp {
        Priority::High
    } else if eur >= thresholds.medium_eur || pp >= thresholds.medium_service_pp {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// 洞察類型（即規則目錄的項目）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    ServiceGap,
    LowResilience,
    CostDelta,
    FillRateDelta,
    Disruption,
}

/// 洞察
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub implementation: String,
    /// 金額影響（EUR，絕對值用於排序）
    pub impact_eur: f64,
    /// 服務衰退（百分點）
    pub service_impact_pp: f64,
}

/// 規則評估所需的輸入
pub struct InsightContext<'a> {
    pub solution: &'a FlowSolution,
    pub metrics: &'a NetworkMetrics,
    pub kpis: &'a KpiSet,
    pub comparison: Option<&'a ScenarioComparison>,
    pub baseline_metrics: Option<&'a NetworkMetrics>,
    pub thresholds: &'a InsightThresholds,
}

/// 規則觸發後、分級前的內容
struct Draft {
    title: String,
    description: String,
    impact: String,
    implementation: String,
    impact_eur: f64,
    service_impact_pp: f64,
}

type Rule = fn(&InsightContext<'_>) -> Option<Draft>;

/// 規則目錄（順序即同分時的排序）
const CATALOG: &[(InsightKind, Rule)] = &[
    (InsightKind::ServiceGap, service_gap),
    (InsightKind::LowResilience, low_resilience),
    (InsightKind::CostDelta, cost_delta),
    (InsightKind::FillRateDelta, fill_rate_delta),
    (InsightKind::Disruption, disruption),
];

/// 比較時視為 0 的差異
const DELTA_EPSILON: f64 = 1e-6;

/// 產生已排序的洞察
pub fn generate(ctx: &InsightContext<'_>) -> Vec<Insight> {
    let mut insights: Vec<Insight> = CATALOG
        .iter()
        .filter_map(|(kind, rule)| {
            rule(ctx).map(|draft| Insight {
                kind: *kind,
                priority: classify_priority(draft.impact_eur, draft.service_impact_pp, ctx.thresholds),
                title: draft.title,
                description: draft.description,
                impact: draft.impact,
                implementation: draft.implementation,
                impact_eur: draft.impact_eur,
                service_impact_pp: draft.service_impact_pp,
            })
        })
        .collect();

    sort_insights(&mut insights);
    tracing::debug!("產生 {} 則洞察", insights.len());
    insights
}

/// 依優先級、再依金額影響絕對值遞減排序；穩定排序保留目錄順序
pub fn sort_insights(insights: &mut [Insight]) {
    insights.sort_by(|a, b| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| b.impact_eur.abs().total_cmp(&a.impact_eur.abs()))
    });
}

fn kpi_text(ctx: &InsightContext<'_>, name: KpiName, field: fn(&crate::kpi::Kpi) -> &str) -> String {
    ctx.kpis.get(name).map(|k| field(k).to_string()).unwrap_or_default()
}

fn service_gap(ctx: &InsightContext<'_>) -> Option<Draft> {
    let fill = ctx.metrics.fill_rate_pct;
    let gap = 100.0 - fill;
    if gap <= DELTA_EPSILON {
        return None;
    }
    Some(Draft {
        title: "Service Level Gap Identified".to_string(),
        description: format!(
            "Network fulfills {} of demand, missing {}pp vs target. {}.",
            format::pct(fill),
            format::number(gap, 1),
            kpi_text(ctx, KpiName::FillRate, |k| k.context.as_str())
        ),
        impact: kpi_text(ctx, KpiName::FillRate, |k| k.impact.as_str()),
        implementation: "Capacity expansion in constrained regions (18-24 month timeline)".to_string(),
        impact_eur: ctx.metrics.lost_revenue,
        service_impact_pp: gap,
    })
}

fn low_resilience(ctx: &InsightContext<'_>) -> Option<Draft> {
    let score = ctx.metrics.resilience.score;
    if score >= ctx.thresholds.low_resilience_score {
        return None;
    }
    Some(Draft {
        title: "Low Supply Chain Resilience".to_string(),
        description: format!(
            "Network resilience score of {}/100 indicates vulnerability to disruptions. {}",
            score,
            kpi_text(ctx, KpiName::NetworkResilienceScore, |k| k.context.as_str())
        ),
        impact: kpi_text(ctx, KpiName::NetworkResilienceScore, |k| k.impact.as_str()),
        implementation: kpi_text(ctx, KpiName::NetworkResilienceScore, |k| k.action.as_str()),
        impact_eur: ctx.metrics.revenue_exposed_largest_plant,
        service_impact_pp: 0.0,
    })
}

fn cost_delta(ctx: &InsightContext<'_>) -> Option<Draft> {
    let comparison = ctx.comparison?;
    let delta = comparison.cost_delta();
    if delta.abs() <= DELTA_EPSILON {
        return None;
    }
    let pct = comparison
        .cost_delta_pct()
        .map(|p| format!("{}%", format::signed(p, 1)))
        .unwrap_or_else(|| "n/a".to_string());
    let driver = kpi_text(ctx, KpiName::TotalCost, |k| k.driver.as_str());

    let description = format!(
        "Scenario {} changes network cost by {} vs {}. Primary cost drivers: {}",
        comparison.scenario_id, pct, comparison.baseline_id, driver
    );
    let (title, implementation) = if delta < 0.0 {
        (
            format!("{} Annual Cost Reduction Identified", format::eur(-delta)),
            "Phased rollout: high-impact changes first (6 months), then full network optimization (12 months)",
        )
    } else {
        (
            format!("{} Annual Cost Increase", format::eur(delta)),
            "Review cost drivers and establish mitigation before committing to this configuration",
        )
    };

    Some(Draft {
        title,
        description,
        impact: kpi_text(ctx, KpiName::TotalCost, |k| k.impact.as_str()),
        implementation: implementation.to_string(),
        impact_eur: delta,
        service_impact_pp: 0.0,
    })
}

fn fill_rate_delta(ctx: &InsightContext<'_>) -> Option<Draft> {
    let comparison = ctx.comparison?;
    let delta_pp = comparison.fill_rate_delta_pp();
    if delta_pp.abs() <= DELTA_EPSILON {
        return None;
    }
    let lost_revenue_delta = ctx
        .baseline_metrics
        .map_or(0.0, |base| ctx.metrics.lost_revenue - base.lost_revenue);

    let (title, implementation) = if delta_pp < 0.0 {
        (
            "Service Level Trade-off",
            "Segment markets: premium (maintain 98%+) vs standard (accept 90-95%)",
        )
    } else {
        ("Service Level Improvement", "Lock in the improved allocation in the operating plan")
    };

    Some(Draft {
        title: title.to_string(),
        description: format!(
            "Fill rate moves {}pp vs {} to {}.",
            format::signed(delta_pp, 1),
            comparison.baseline_id,
            format::pct(ctx.metrics.fill_rate_pct)
        ),
        impact: format!("{} change in lost revenue", format::signed_eur(lost_revenue_delta)),
        implementation: implementation.to_string(),
        impact_eur: lost_revenue_delta,
        service_impact_pp: (-delta_pp).max(0.0),
    })
}

fn disruption(ctx: &InsightContext<'_>) -> Option<Draft> {
    let disabled = &ctx.solution.disabled_plants;
    if disabled.is_empty() {
        return None;
    }
    let names = disabled.iter().cloned().collect::<Vec<_>>().join(", ");

    let (impact_eur, service_impact_pp, description) = match ctx.comparison {
        Some(comparison) => (
            comparison.cost_delta(),
            (-comparison.fill_rate_delta_pp()).max(0.0),
            format!(
                "Outage of {} causes {} cost change vs {}. Fill rate drops to {} during disruption.",
                names,
                format::signed_eur(comparison.cost_delta()),
                comparison.baseline_id,
                format::pct(ctx.metrics.fill_rate_pct)
            ),
        ),
        None => (
            ctx.metrics.lost_revenue,
            100.0 - ctx.metrics.fill_rate_pct,
            format!(
                "Outage of {} leaves {} units unfulfilled. Fill rate drops to {} during disruption.",
                names,
                format::units(ctx.metrics.total_unmet),
                format::pct(ctx.metrics.fill_rate_pct)
            ),
        ),
    };

    Some(Draft {
        title: format!("Critical Single Point of Failure: {}", names),
        description,
        impact: format!(
            "{} of network capacity offline, {} lost revenue",
            format::pct(ctx.metrics.disabled_capacity_share * 100.0),
            format::eur(ctx.metrics.lost_revenue)
        ),
        implementation: "URGENT: Establish backup production agreements and increase safety stock".to_string(),
        impact_eur,
        service_impact_pp,
    })
}
