//! 網路拓撲存儲（載入後唯讀）

use std::collections::{HashMap, HashSet};

use crate::network::{DistributionCenter, Market, Plant, Route, RouteClass, RouteKey};
use crate::{NetoptError, Result};

/// 網路拓撲
///
/// 建立時完成驗證，之後不可變更；情境差異一律透過 [`crate::ScenarioSpec`] 表達，
/// 因此可在多個並行求解之間以 `Arc<Topology>` 共享。
#[derive(Debug, Clone)]
pub struct Topology {
    plants: Vec<Plant>,
    dcs: Vec<DistributionCenter>,
    markets: Vec<Market>,
    routes: Vec<Route>,

    plant_index: HashMap<String, usize>,
    dc_index: HashMap<String, usize>,
    market_index: HashMap<String, usize>,
    route_index: HashMap<RouteKey, usize>,
}

impl Topology {
    /// 創建並驗證拓撲
    pub fn new(
        plants: Vec<Plant>,
        dcs: Vec<DistributionCenter>,
        markets: Vec<Market>,
        routes: Vec<Route>,
    ) -> Result<Self> {
        let mut seen: HashSet<&str> = HashSet::new();

        let plant_index = build_index(plants.iter().map(|p| p.id.as_str()), &mut seen, "工廠")?;
        let dc_index = build_index(dcs.iter().map(|d| d.id.as_str()), &mut seen, "配送中心")?;
        let market_index = build_index(markets.iter().map(|m| m.id.as_str()), &mut seen, "市場")?;

        for plant in &plants {
            ensure_non_negative(&plant.id, "annual_capacity", plant.annual_capacity)?;
            ensure_non_negative(&plant.id, "unit_cost", plant.unit_cost)?;
        }
        for dc in &dcs {
            ensure_non_negative(&dc.id, "storage_capacity", dc.storage_capacity)?;
            ensure_non_negative(&dc.id, "fixed_monthly_cost", dc.fixed_monthly_cost)?;
            ensure_non_negative(&dc.id, "variable_unit_cost", dc.variable_unit_cost)?;
        }
        for market in &markets {
            ensure_non_negative(&market.id, "annual_demand", market.annual_demand)?;
            ensure_non_negative(&market.id, "revenue_per_unit", market.revenue_per_unit)?;
        }

        let mut route_index = HashMap::with_capacity(routes.len());
        for (idx, route) in routes.iter().enumerate() {
            let endpoints_ok = match route.class {
                RouteClass::PlantToDc => {
                    plant_index.contains_key(&route.origin) && dc_index.contains_key(&route.destination)
                }
                RouteClass::DcToMarket => {
                    dc_index.contains_key(&route.origin) && market_index.contains_key(&route.destination)
                }
            };
            if !endpoints_ok {
                return Err(NetoptError::InvalidTopology(format!(
                    "路線 {} 的端點不存在或與類別 {:?} 不符",
                    route.key(),
                    route.class
                )));
            }

            let key = route.key();
            ensure_non_negative(&key.to_string(), "unit_cost", route.unit_cost)?;
            ensure_non_negative(&key.to_string(), "lead_time_days", route.lead_time_days)?;
            if let Some(co2) = route.co2_kg_per_unit {
                ensure_non_negative(&key.to_string(), "co2_kg_per_unit", co2)?;
            }

            if route_index.insert(key.clone(), idx).is_some() {
                return Err(NetoptError::InvalidTopology(format!("重複的路線: {}", key)));
            }
        }

        Ok(Self {
            plants,
            dcs,
            markets,
            routes,
            plant_index,
            dc_index,
            market_index,
            route_index,
        })
    }

    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    pub fn distribution_centers(&self) -> &[DistributionCenter] {
        &self.dcs
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// 指定類別的路線
    pub fn routes_of(&self, class: RouteClass) -> impl Iterator<Item = &Route> {
        self.routes.iter().filter(move |r| r.class == class)
    }

    pub fn plant(&self, id: &str) -> Option<&Plant> {
        self.plant_index.get(id).map(|&i| &self.plants[i])
    }

    pub fn distribution_center(&self, id: &str) -> Option<&DistributionCenter> {
        self.dc_index.get(id).map(|&i| &self.dcs[i])
    }

    pub fn market(&self, id: &str) -> Option<&Market> {
        self.market_index.get(id).map(|&i| &self.markets[i])
    }

    pub fn route(&self, origin: &str, destination: &str) -> Option<&Route> {
        self.route_index
            .get(&RouteKey::new(origin, destination))
            .map(|&i| &self.routes[i])
    }

    /// 總需求量
    pub fn total_demand(&self) -> f64 {
        self.markets.iter().map(|m| m.annual_demand).sum()
    }

    /// 總產能（含停用工廠）
    pub fn total_capacity(&self) -> f64 {
        self.plants.iter().map(|p| p.annual_capacity).sum()
    }

    /// 產能最大的啟用工廠（同產能時取先載入者）
    pub fn largest_plant(&self) -> Option<&Plant> {
        self.plants
            .iter()
            .filter(|p| p.active)
            .fold(None, |best: Option<&Plant>, p| match best {
                Some(b) if b.annual_capacity >= p.annual_capacity => Some(b),
                _ => Some(p),
            })
    }
}

fn build_index<'a>(
    ids: impl Iterator<Item = &'a str>,
    seen: &mut HashSet<&'a str>,
    label: &str,
) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::new();
    for (i, id) in ids.enumerate() {
        if id.is_empty() {
            return Err(NetoptError::InvalidTopology(format!("{}ID 不可為空", label)));
        }
        if !seen.insert(id) {
            return Err(NetoptError::InvalidTopology(format!("重複的節點ID: {}", id)));
        }
        index.insert(id.to_string(), i);
    }
    Ok(index)
}

fn ensure_non_negative(owner: &str, field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(NetoptError::InvalidTopology(format!(
            "{} 的 {} 必須為非負有限數值，實際為 {}",
            owner, field, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Location, TransportMode};

    fn loc() -> Location {
        Location::new(0.0, 0.0)
    }

    fn sample() -> Topology {
        Topology::new(
            vec![
                Plant::new("P1", loc(), 100.0, 1.0),
                Plant::new("P2", Location::new(10.0, 10.0), 150.0, 1.2),
            ],
            vec![DistributionCenter::new("DC1", loc(), 500.0, 0.0, 0.0)],
            vec![Market::new("M1", loc(), 80.0, 2.5)],
            vec![
                Route::supply("P1", "DC1", TransportMode::Road, 0.5, 1.0),
                Route::supply("P2", "DC1", TransportMode::Sea, 0.7, 8.0),
                Route::delivery("DC1", "M1", TransportMode::Road, 0.5, 2.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_and_totals() {
        let topology = sample();
        assert_eq!(topology.plants().len(), 2);
        assert!(topology.plant("P1").is_some());
        assert!(topology.market("P1").is_none());
        assert!(topology.route("DC1", "M1").is_some());
        assert!(topology.route("M1", "DC1").is_none());
        assert_eq!(topology.total_demand(), 80.0);
        assert_eq!(topology.total_capacity(), 250.0);
        assert_eq!(topology.largest_plant().unwrap().id, "P2");
        assert_eq!(topology.routes_of(RouteClass::PlantToDc).count(), 2);
    }

    #[test]
    fn test_rejects_duplicate_ids_across_classes() {
        let result = Topology::new(
            vec![Plant::new("X", loc(), 1.0, 1.0)],
            vec![DistributionCenter::new("X", loc(), 1.0, 0.0, 0.0)],
            vec![],
            vec![],
        );
        assert!(matches!(result, Err(NetoptError::InvalidTopology(_))));
    }

    #[test]
    fn test_rejects_route_with_wrong_class() {
        // 工廠直送市場不屬於合法路線類別
        let result = Topology::new(
            vec![Plant::new("P1", loc(), 1.0, 1.0)],
            vec![DistributionCenter::new("DC1", loc(), 1.0, 0.0, 0.0)],
            vec![Market::new("M1", loc(), 1.0, 1.0)],
            vec![Route::delivery("P1", "M1", TransportMode::Road, 0.1, 1.0)],
        );
        assert!(matches!(result, Err(NetoptError::InvalidTopology(_))));
    }

    #[test]
    fn test_rejects_negative_capacity() {
        let result = Topology::new(
            vec![Plant::new("P1", loc(), -5.0, 1.0)],
            vec![],
            vec![],
            vec![],
        );
        assert!(matches!(result, Err(NetoptError::InvalidTopology(_))));
    }

    #[test]
    fn test_rejects_duplicate_route() {
        let result = Topology::new(
            vec![Plant::new("P1", loc(), 1.0, 1.0)],
            vec![DistributionCenter::new("DC1", loc(), 1.0, 0.0, 0.0)],
            vec![],
            vec![
                Route::supply("P1", "DC1", TransportMode::Road, 0.1, 1.0),
                Route::supply("P1", "DC1", TransportMode::Sea, 0.2, 5.0),
            ],
        );
        assert!(matches!(result, Err(NetoptError::InvalidTopology(_))));
    }
}
