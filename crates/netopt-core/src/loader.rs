//! 拓撲資料載入（JSON 文件 / CSV 目錄）

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::network::{DistributionCenter, Location, Market, Plant, Route, RouteClass, TransportMode};
use crate::topology::Topology;
use crate::{NetoptError, Result};

/// CSV 資料中以「百萬單位」表示的數量
const MILLION: f64 = 1e6;

/// JSON 拓撲文件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyDocument {
    pub plants: Vec<Plant>,
    pub distribution_centers: Vec<DistributionCenter>,
    pub markets: Vec<Market>,
    pub routes: Vec<Route>,
}

impl TopologyDocument {
    pub fn into_topology(self) -> Result<Topology> {
        Topology::new(self.plants, self.distribution_centers, self.markets, self.routes)
    }
}

/// 從 JSON 字串載入拓撲
pub fn from_json_str(json: &str) -> Result<Topology> {
    let document: TopologyDocument = serde_json::from_str(json)?;
    document.into_topology()
}

/// 從 JSON 讀取器載入拓撲
pub fn from_json_reader<R: Read>(reader: R) -> Result<Topology> {
    let document: TopologyDocument = serde_json::from_reader(reader)?;
    document.into_topology()
}

#[derive(Debug, Deserialize)]
struct PlantRow {
    plant_id: String,
    #[serde(default)]
    name: String,
    latitude: f64,
    longitude: f64,
    capacity_annual_millions: f64,
    cost_per_unit_eur: f64,
    #[serde(default)]
    active: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DcRow {
    dc_id: String,
    #[serde(default)]
    name: String,
    latitude: f64,
    longitude: f64,
    storage_capacity_millions: f64,
    fixed_cost_monthly_eur: f64,
    variable_cost_per_unit_eur: f64,
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarketRow {
    market_id: String,
    #[serde(default)]
    name: String,
    latitude: f64,
    longitude: f64,
    annual_demand_millions: f64,
    revenue_per_unit_eur: f64,
    #[serde(default)]
    seasonality_summer_multiplier: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RouteRow {
    from_id: String,
    to_id: String,
    from_type: String,
    #[serde(default)]
    distance_km: Option<f64>,
    transport_mode: String,
    cost_per_unit_eur: f64,
    lead_time_days: f64,
    #[serde(default)]
    co2_per_unit_kg: Option<f64>,
}

/// 從 CSV 目錄載入拓撲
///
/// 目錄需包含 `plants.csv`、`distribution_centers.csv`、`markets.csv`、
/// `transportation.csv`；容量與需求欄位以百萬單位表示。
pub fn from_csv_dir(dir: impl AsRef<Path>) -> Result<Topology> {
    let dir = dir.as_ref();
    tracing::info!("從 CSV 目錄載入拓撲: {}", dir.display());
    let topology = from_csv_readers(
        File::open(dir.join("plants.csv"))?,
        File::open(dir.join("distribution_centers.csv"))?,
        File::open(dir.join("markets.csv"))?,
        File::open(dir.join("transportation.csv"))?,
    )?;
    tracing::info!(
        "拓撲載入完成: {} 座工廠，{} 個配送中心，{} 個市場，{} 條路線",
        topology.plants().len(),
        topology.distribution_centers().len(),
        topology.markets().len(),
        topology.routes().len()
    );
    Ok(topology)
}

/// 從四個 CSV 讀取器載入拓撲
pub fn from_csv_readers<P: Read, D: Read, M: Read, R: Read>(
    plants: P,
    dcs: D,
    markets: M,
    routes: R,
) -> Result<Topology> {
    let plants = read_rows::<PlantRow, _>(plants)?
        .into_iter()
        .map(|row| {
            let plant = Plant::new(
                row.plant_id.clone(),
                Location::new(row.latitude, row.longitude),
                row.capacity_annual_millions * MILLION,
                row.cost_per_unit_eur,
            )
            .with_active(row.active.unwrap_or(true));
            if row.name.is_empty() {
                plant
            } else {
                plant.with_name(row.name)
            }
        })
        .collect();

    let dcs = read_rows::<DcRow, _>(dcs)?
        .into_iter()
        .map(|row| {
            let mut dc = DistributionCenter::new(
                row.dc_id.clone(),
                Location::new(row.latitude, row.longitude),
                row.storage_capacity_millions * MILLION,
                row.fixed_cost_monthly_eur,
                row.variable_cost_per_unit_eur,
            );
            if !row.name.is_empty() {
                dc = dc.with_name(row.name);
            }
            if let Some(region) = row.region.filter(|r| !r.is_empty()) {
                dc = dc.with_region(region);
            }
            dc
        })
        .collect();

    let markets = read_rows::<MarketRow, _>(markets)?
        .into_iter()
        .map(|row| {
            let market = Market::new(
                row.market_id.clone(),
                Location::new(row.latitude, row.longitude),
                row.annual_demand_millions * MILLION,
                row.revenue_per_unit_eur,
            )
            .with_seasonality(row.seasonality_summer_multiplier.unwrap_or(1.0));
            if row.name.is_empty() {
                market
            } else {
                market.with_name(row.name)
            }
        })
        .collect();

    let routes = read_rows::<RouteRow, _>(routes)?
        .into_iter()
        .map(route_from_row)
        .collect::<Result<Vec<_>>>()?;

    Topology::new(plants, dcs, markets, routes)
}

fn read_rows<T: for<'de> Deserialize<'de>, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

fn route_from_row(row: RouteRow) -> Result<Route> {
    let mode = match row.transport_mode.to_ascii_lowercase().as_str() {
        "road" => TransportMode::Road,
        "sea" => TransportMode::Sea,
        other => {
            return Err(NetoptError::InvalidTopology(format!(
                "路線 {}->{} 的運輸方式無法識別: {}",
                row.from_id, row.to_id, other
            )))
        }
    };

    let class = match row.from_type.to_ascii_lowercase().as_str() {
        "plant" => RouteClass::PlantToDc,
        "dc" => RouteClass::DcToMarket,
        other => {
            return Err(NetoptError::InvalidTopology(format!(
                "路線 {}->{} 的起點類型無法識別: {}",
                row.from_id, row.to_id, other
            )))
        }
    };

    let mut route = match class {
        RouteClass::PlantToDc => {
            Route::supply(row.from_id, row.to_id, mode, row.cost_per_unit_eur, row.lead_time_days)
        }
        RouteClass::DcToMarket => {
            Route::delivery(row.from_id, row.to_id, mode, row.cost_per_unit_eur, row.lead_time_days)
        }
    };
    if let Some(distance) = row.distance_km {
        route = route.with_distance_km(distance);
    }
    if let Some(co2) = row.co2_per_unit_kg {
        route = route.with_co2_kg_per_unit(co2);
    }
    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLANTS: &str = "\
plant_id,name,city,country,latitude,longitude,capacity_annual_millions,cost_per_unit_eur,notes
P1,HQ Plant,Fuschl am See,Austria,47.8011,13.2697,500,0.18,Largest facility
P2,NA Plant,Concord,USA,35.4087,-80.5795,300,0.22,Americas
";

    const DCS: &str = "\
dc_id,name,city,country,latitude,longitude,storage_capacity_millions,fixed_cost_monthly_eur,variable_cost_per_unit_eur,region
DC1,European Hub,Vienna,Austria,48.2082,16.3738,50,180000,0.03,Europe
";

    const MARKETS: &str = "\
market_id,name,country,latitude,longitude,annual_demand_millions,revenue_per_unit_eur,seasonality_summer_multiplier,market_maturity
M1,Germany,Germany,51.1657,10.4515,85,2.65,1.2,Mature
";

    const ROUTES: &str = "\
from_id,to_id,from_type,to_type,distance_km,transport_mode,cost_per_unit_eur,lead_time_days,co2_per_unit_kg,capacity_constraint
P1,DC1,plant,dc,235.2,road,0.02,1,0.05,unlimited
P2,DC1,plant,dc,7700.1,sea,0.031,9,0.08,unlimited
DC1,M1,dc,market,520.4,road,0.015,1,0.03,unlimited
";

    #[test]
    fn test_from_csv_readers() {
        let topology = from_csv_readers(
            PLANTS.as_bytes(),
            DCS.as_bytes(),
            MARKETS.as_bytes(),
            ROUTES.as_bytes(),
        )
        .unwrap();

        assert_eq!(topology.plants().len(), 2);
        let p1 = topology.plant("P1").unwrap();
        assert_eq!(p1.annual_capacity, 500.0 * MILLION);
        assert_eq!(p1.name, "HQ Plant");

        let dc = topology.distribution_center("DC1").unwrap();
        assert_eq!(dc.region.as_deref(), Some("Europe"));
        assert_eq!(dc.fixed_monthly_cost, 180000.0);

        assert_eq!(topology.market("M1").unwrap().seasonality_factor, 1.2);

        let sea = topology.route("P2", "DC1").unwrap();
        assert_eq!(sea.mode, TransportMode::Sea);
        assert_eq!(sea.class, RouteClass::PlantToDc);
        assert_eq!(sea.co2_kg_per_unit, Some(0.08));
        assert_eq!(topology.route("DC1", "M1").unwrap().class, RouteClass::DcToMarket);
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let routes = "\
from_id,to_id,from_type,to_type,distance_km,transport_mode,cost_per_unit_eur,lead_time_days,co2_per_unit_kg
P1,DC1,plant,dc,235.2,air,0.02,1,0.05
";
        let result = from_csv_readers(PLANTS.as_bytes(), DCS.as_bytes(), MARKETS.as_bytes(), routes.as_bytes());
        assert!(matches!(result, Err(NetoptError::InvalidTopology(_))));
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "plants": [{"id": "P1", "location": {"latitude": 0, "longitude": 0}, "annual_capacity": 100, "unit_cost": 1}],
            "distribution_centers": [{"id": "DC1", "location": {"latitude": 0, "longitude": 0}, "storage_capacity": 100, "fixed_monthly_cost": 0, "variable_unit_cost": 0}],
            "markets": [{"id": "M1", "location": {"latitude": 0, "longitude": 0}, "annual_demand": 80, "revenue_per_unit": 2}],
            "routes": [
                {"origin": "P1", "destination": "DC1", "class": "plant_to_dc", "mode": "road", "unit_cost": 0.5, "lead_time_days": 1},
                {"origin": "DC1", "destination": "M1", "class": "dc_to_market", "mode": "road", "unit_cost": 0.5, "lead_time_days": 2}
            ]
        }"#;

        let topology = from_json_str(json).unwrap();
        assert_eq!(topology.total_demand(), 80.0);
        assert_eq!(topology.routes().len(), 2);
    }

    #[test]
    fn test_json_with_dangling_route_fails() {
        let json = r#"{
            "plants": [],
            "distribution_centers": [],
            "markets": [],
            "routes": [{"origin": "P1", "destination": "DC1", "class": "plant_to_dc", "mode": "road", "unit_cost": 0.5, "lead_time_days": 1}]
        }"#;
        assert!(matches!(from_json_str(json), Err(NetoptError::InvalidTopology(_))));
    }
}
