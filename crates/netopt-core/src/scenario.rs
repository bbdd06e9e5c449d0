//! 情境參數覆寫模型

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::solution::CostComponent;
use crate::topology::Topology;
use crate::{NetoptError, Result};

/// 各成本組成的乘數（1.0 = 不調整）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostMultipliers {
    pub production: f64,
    pub transport_plant_dc: f64,
    pub transport_dc_market: f64,
    pub warehousing: f64,
    pub unmet_penalty: f64,
}

impl Default for CostMultipliers {
    fn default() -> Self {
        Self {
            production: 1.0,
            transport_plant_dc: 1.0,
            transport_dc_market: 1.0,
            warehousing: 1.0,
            unmet_penalty: 1.0,
        }
    }
}

impl CostMultipliers {
    pub fn get(&self, component: CostComponent) -> f64 {
        match component {
            CostComponent::Production => self.production,
            CostComponent::TransportPlantDc => self.transport_plant_dc,
            CostComponent::TransportDcMarket => self.transport_dc_market,
            CostComponent::Warehousing => self.warehousing,
            CostComponent::UnmetPenalty => self.unmet_penalty,
        }
    }

    /// 建構器模式：設置單一成本組成的乘數
    pub fn with(mut self, component: CostComponent, multiplier: f64) -> Self {
        let slot = match component {
            CostComponent::Production => &mut self.production,
            CostComponent::TransportPlantDc => &mut self.transport_plant_dc,
            CostComponent::TransportDcMarket => &mut self.transport_dc_market,
            CostComponent::Warehousing => &mut self.warehousing,
            CostComponent::UnmetPenalty => &mut self.unmet_penalty,
        };
        *slot = multiplier;
        self
    }
}

/// 單一路線的容量覆寫
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCapacity {
    pub origin: String,
    pub destination: String,
    pub capacity: f64,
}

/// 情境參數（求解時輸入，不持久化）
///
/// 停用節點以覆寫集合表示，拓撲本身保持不變。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSpec {
    /// 停用的工廠
    pub disabled_plants: BTreeSet<String>,

    /// 停用的配送中心（流入量強制為 0）
    pub disabled_dcs: BTreeSet<String>,

    /// 成本乘數
    pub cost_multipliers: CostMultipliers,

    /// 最低滿足率（0.0 ~ 1.0）
    pub min_fill_rate: Option<f64>,

    /// 路線容量覆寫
    pub route_capacities: Vec<RouteCapacity>,
}

impl ScenarioSpec {
    /// 無任何覆寫的基準情境參數
    pub fn baseline() -> Self {
        Self::default()
    }

    /// 建構器模式：停用工廠
    pub fn with_disabled_plant(mut self, plant_id: impl Into<String>) -> Self {
        self.disabled_plants.insert(plant_id.into());
        self
    }

    /// 建構器模式：停用配送中心
    pub fn with_disabled_dc(mut self, dc_id: impl Into<String>) -> Self {
        self.disabled_dcs.insert(dc_id.into());
        self
    }

    /// 建構器模式：設置最低滿足率
    pub fn with_min_fill_rate(mut self, fill_rate: f64) -> Self {
        self.min_fill_rate = Some(fill_rate);
        self
    }

    /// 建構器模式：設置成本乘數
    pub fn with_cost_multipliers(mut self, multipliers: CostMultipliers) -> Self {
        self.cost_multipliers = multipliers;
        self
    }

    /// 建構器模式：覆寫路線容量
    pub fn with_route_capacity(
        mut self,
        origin: impl Into<String>,
        destination: impl Into<String>,
        capacity: f64,
    ) -> Self {
        self.route_capacities.push(RouteCapacity {
            origin: origin.into(),
            destination: destination.into(),
            capacity,
        });
        self
    }

    /// 檢查工廠在此情境下是否停用（含拓撲中本就停用者）
    pub fn is_plant_disabled(&self, topology: &Topology, plant_id: &str) -> bool {
        self.disabled_plants.contains(plant_id)
            || topology.plant(plant_id).map(|p| !p.active).unwrap_or(false)
    }

    /// 此情境下實際停用的工廠
    pub fn effective_disabled_plants(&self, topology: &Topology) -> BTreeSet<String> {
        topology
            .plants()
            .iter()
            .filter(|p| self.is_plant_disabled(topology, &p.id))
            .map(|p| p.id.clone())
            .collect()
    }

    /// 對拓撲驗證覆寫內容，任何未知ID立即失敗
    pub fn validate(&self, topology: &Topology) -> Result<()> {
        for plant_id in &self.disabled_plants {
            if topology.plant(plant_id).is_none() {
                return Err(NetoptError::UnknownPlant(plant_id.clone()));
            }
        }

        for dc_id in &self.disabled_dcs {
            if topology.distribution_center(dc_id).is_none() {
                return Err(NetoptError::UnknownDistributionCenter(dc_id.clone()));
            }
        }

        for cap in &self.route_capacities {
            if topology.route(&cap.origin, &cap.destination).is_none() {
                return Err(NetoptError::UnknownRoute {
                    origin: cap.origin.clone(),
                    destination: cap.destination.clone(),
                });
            }
            if !cap.capacity.is_finite() || cap.capacity < 0.0 {
                return Err(NetoptError::InvalidOverride(format!(
                    "路線 {}->{} 的容量必須為非負有限數值",
                    cap.origin, cap.destination
                )));
            }
        }

        if let Some(rate) = self.min_fill_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(NetoptError::InvalidOverride(format!(
                    "最低滿足率必須介於 0 與 1 之間，實際為 {}",
                    rate
                )));
            }
        }

        for component in CostComponent::ALL {
            let m = self.cost_multipliers.get(component);
            if !m.is_finite() || m < 0.0 {
                return Err(NetoptError::InvalidOverride(format!(
                    "{} 成本乘數必須為非負有限數值，實際為 {}",
                    component.as_str(),
                    m
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{DistributionCenter, Location, Market, Plant, Route, TransportMode};
    use rstest::rstest;

    fn topology() -> Topology {
        let loc = Location::new(0.0, 0.0);
        Topology::new(
            vec![
                Plant::new("P1", loc, 100.0, 1.0),
                Plant::new("P2", loc, 50.0, 1.0).with_active(false),
            ],
            vec![DistributionCenter::new("DC1", loc, 100.0, 0.0, 0.0)],
            vec![Market::new("M1", loc, 80.0, 2.0)],
            vec![
                Route::supply("P1", "DC1", TransportMode::Road, 0.5, 1.0),
                Route::delivery("DC1", "M1", TransportMode::Road, 0.5, 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_builder() {
        let spec = ScenarioSpec::baseline()
            .with_disabled_plant("P1")
            .with_min_fill_rate(0.9)
            .with_route_capacity("P1", "DC1", 40.0)
            .with_cost_multipliers(CostMultipliers::default().with(CostComponent::Production, 1.1));

        assert!(spec.disabled_plants.contains("P1"));
        assert_eq!(spec.min_fill_rate, Some(0.9));
        assert_eq!(spec.route_capacities.len(), 1);
        assert_eq!(spec.cost_multipliers.production, 1.1);
        assert!(spec.validate(&topology()).is_ok());
    }

    #[test]
    fn test_inactive_plant_is_effectively_disabled() {
        let topology = topology();
        let spec = ScenarioSpec::baseline();
        let disabled = spec.effective_disabled_plants(&topology);
        assert_eq!(disabled.into_iter().collect::<Vec<_>>(), vec!["P2".to_string()]);
    }

    #[rstest]
    #[case(ScenarioSpec::baseline().with_disabled_plant("P9"), "invalid_override")]
    #[case(ScenarioSpec::baseline().with_disabled_dc("DC9"), "invalid_override")]
    #[case(ScenarioSpec::baseline().with_route_capacity("DC1", "M9", 1.0), "invalid_override")]
    #[case(ScenarioSpec::baseline().with_min_fill_rate(1.5), "invalid_override")]
    #[case(
        ScenarioSpec::baseline().with_cost_multipliers(CostMultipliers::default().with(CostComponent::Warehousing, -1.0)),
        "invalid_override"
    )]
    fn test_validate_rejects(#[case] spec: ScenarioSpec, #[case] kind: &str) {
        let err = spec.validate(&topology()).unwrap_err();
        assert_eq!(err.kind(), kind);
    }

    #[test]
    fn test_unknown_plant_error_variant() {
        let err = ScenarioSpec::baseline()
            .with_disabled_plant("P9")
            .validate(&topology())
            .unwrap_err();
        assert!(matches!(err, NetoptError::UnknownPlant(id) if id == "P9"));
    }
}
