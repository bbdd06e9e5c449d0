//! KPI 資料模型

use std::collections::BTreeMap;

use serde::Serialize;

use crate::insight::Priority;

/// KPI 名稱（固定清單）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiName {
    TotalCost,
    FillRate,
    AvgLeadTime,
    Co2Emissions,
    CostPerUnit,
    NetworkResilienceScore,
}

impl KpiName {
    pub const ALL: [KpiName; 6] = [
        KpiName::TotalCost,
        KpiName::FillRate,
        KpiName::AvgLeadTime,
        KpiName::Co2Emissions,
        KpiName::CostPerUnit,
        KpiName::NetworkResilienceScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KpiName::TotalCost => "total_cost",
            KpiName::FillRate => "fill_rate",
            KpiName::AvgLeadTime => "avg_lead_time",
            KpiName::Co2Emissions => "co2_emissions",
            KpiName::CostPerUnit => "cost_per_unit",
            KpiName::NetworkResilienceScore => "network_resilience_score",
        }
    }
}

/// 相對基準的差異
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiDelta {
    pub absolute: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
}

impl KpiDelta {
    pub fn between(current: f64, reference: f64) -> Self {
        Self {
            absolute: current - reference,
            percent: (reference != 0.0).then(|| (current / reference - 1.0) * 100.0),
        }
    }

    /// 百分點差異（不計算相對百分比）
    pub fn points(current: f64, reference: f64) -> Self {
        Self {
            absolute: current - reference,
            percent: None,
        }
    }
}

/// 單一 KPI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    #[serde(skip)]
    pub name: KpiName,
    pub value: f64,
    pub formatted: String,
    pub unit: String,
    pub benchmark: String,
    pub context: String,
    pub impact: String,
    pub driver: String,
    pub action: String,
    /// 無基準時省略（與「差異為 0」區分）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<KpiDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl Kpi {
    pub fn new(name: KpiName, value: f64, formatted: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name,
            value,
            formatted: formatted.into(),
            unit: unit.into(),
            benchmark: String::new(),
            context: String::new(),
            impact: String::new(),
            driver: String::new(),
            action: String::new(),
            delta: None,
            priority: None,
        }
    }

    pub fn with_benchmark(mut self, benchmark: impl Into<String>) -> Self {
        self.benchmark = benchmark.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = impact.into();
        self
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_delta(mut self, delta: Option<KpiDelta>) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority;
        self
    }
}

/// KPI 集合，序列化為 `{<kpi name>: {...}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct KpiSet {
    kpis: BTreeMap<KpiName, Kpi>,
}

impl KpiSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kpi: Kpi) {
        self.kpis.insert(kpi.name, kpi);
    }

    pub fn get(&self, name: KpiName) -> Option<&Kpi> {
        self.kpis.get(&name)
    }

    pub fn value(&self, name: KpiName) -> Option<f64> {
        self.get(name).map(|k| k.value)
    }

    /// 依 [`KpiName::ALL`] 順序迭代
    pub fn iter(&self) -> impl Iterator<Item = &Kpi> {
        self.kpis.values()
    }

    pub fn len(&self) -> usize {
        self.kpis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kpis.is_empty()
    }
}
