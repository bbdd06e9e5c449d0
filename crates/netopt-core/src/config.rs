//! 優化器配置

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::network::TransportMode;
use crate::{NetoptError, Result};

/// 優化器全域配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// 求解時間上限（秒）
    pub time_limit_secs: u64,

    /// 未滿足需求的單位懲罰（EUR），須高於任何可行路徑成本
    pub unmet_penalty_per_unit: f64,

    /// 每年月數（配送中心固定月成本年化用）
    pub months_per_year: u32,

    /// 數值容差：絕對值低於此值的變數視為 0
    pub flow_tolerance: f64,

    /// 運輸方式排放係數
    pub emission_factors: EmissionFactors,

    /// 韌性分數權重
    pub resilience: ResilienceWeights,

    /// 洞察優先級門檻
    pub insight_thresholds: InsightThresholds,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 30,
            unmet_penalty_per_unit: 5.0,
            months_per_year: 12,
            flow_tolerance: 1e-9,
            emission_factors: EmissionFactors::default(),
            resilience: ResilienceWeights::default(),
            insight_thresholds: InsightThresholds::default(),
        }
    }
}

impl OptimizerConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 JSON 載入（缺少的欄位使用預設值）
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置求解時間上限
    pub fn with_time_limit_secs(mut self, secs: u64) -> Self {
        self.time_limit_secs = secs;
        self
    }

    /// 建構器模式：設置未滿足需求懲罰
    pub fn with_unmet_penalty(mut self, penalty: f64) -> Self {
        self.unmet_penalty_per_unit = penalty;
        self
    }

    /// 建構器模式：設置排放係數
    pub fn with_emission_factors(mut self, factors: EmissionFactors) -> Self {
        self.emission_factors = factors;
        self
    }

    /// 建構器模式：設置韌性權重
    pub fn with_resilience_weights(mut self, weights: ResilienceWeights) -> Self {
        self.resilience = weights;
        self
    }

    /// 建構器模式：設置洞察門檻
    pub fn with_insight_thresholds(mut self, thresholds: InsightThresholds) -> Self {
        self.insight_thresholds = thresholds;
        self
    }

    /// 求解時間上限
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }

    /// 驗證配置
    pub fn validate(&self) -> Result<()> {
        if self.time_limit_secs == 0 {
            return Err(NetoptError::InvalidConfig("求解時間上限必須大於 0".to_string()));
        }
        if !self.unmet_penalty_per_unit.is_finite() || self.unmet_penalty_per_unit <= 0.0 {
            return Err(NetoptError::InvalidConfig(
                "未滿足需求懲罰必須為正數".to_string(),
            ));
        }
        if !self.flow_tolerance.is_finite() || self.flow_tolerance < 0.0 {
            return Err(NetoptError::InvalidConfig("數值容差不可為負".to_string()));
        }
        let w = &self.resilience;
        let weight_sum = w.idle_capacity + w.geographic_spread + w.diversification;
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(NetoptError::InvalidConfig(format!(
                "韌性權重合計必須為 1，實際為 {}",
                weight_sum
            )));
        }
        Ok(())
    }
}

/// 運輸方式排放係數（kg CO2 / 單位）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionFactors {
    pub road_kg_per_unit: f64,
    pub sea_kg_per_unit: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            road_kg_per_unit: 0.05,
            sea_kg_per_unit: 0.08,
        }
    }
}

impl EmissionFactors {
    pub fn factor(&self, mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Road => self.road_kg_per_unit,
            TransportMode::Sea => self.sea_kg_per_unit,
        }
    }
}

/// 韌性分數權重（三項合計為 1）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceWeights {
    /// 具閒置產能的工廠數
    pub idle_capacity: f64,

    /// 啟用工廠的地理分散度
    pub geographic_spread: f64,

    /// 產能分散度（1 - 最大工廠產能占比）
    pub diversification: f64,

    /// 具閒置產能工廠數達此值時該項取滿分
    pub backup_plant_target: u32,

    /// 平均工廠間距離達此值（公里）時分散度取滿分
    pub reference_spread_km: f64,
}

impl Default for ResilienceWeights {
    fn default() -> Self {
        Self {
            idle_capacity: 0.4,
            geographic_spread: 0.3,
            diversification: 0.3,
            backup_plant_target: 3,
            reference_spread_km: 5000.0,
        }
    }
}

/// 洞察優先級門檻
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightThresholds {
    /// 金額影響高於此值為高優先（EUR）
    pub high_eur: f64,

    /// 金額影響不低於此值為中優先（EUR）
    pub medium_eur: f64,

    /// 服務衰退高於此值為高優先（百分點）
    pub high_service_pp: f64,

    /// 服務衰退不低於此值為中優先（百分點）
    pub medium_service_pp: f64,

    /// 韌性分數低於此值觸發低韌性洞察
    pub low_resilience_score: f64,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            high_eur: 10_000_000.0,
            medium_eur: 5_000_000.0,
            high_service_pp: 5.0,
            medium_service_pp: 2.0,
            low_resilience_score: 70.0,
        }
    }
}
