//! 網路節點與路線模型

use serde::{Deserialize, Serialize};

/// 地球平均半徑（公里）
const EARTH_RADIUS_KM: f64 = 6371.0;

/// 地理位置（十進位經緯度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// 大圓距離（Haversine，公里）
    pub fn distance_km(&self, other: &Location) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// 生產工廠
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    /// 工廠ID
    pub id: String,

    /// 名稱
    #[serde(default)]
    pub name: String,

    /// 位置
    pub location: Location,

    /// 年產能（單位）
    pub annual_capacity: f64,

    /// 單位生產成本（EUR）
    pub unit_cost: f64,

    /// 是否啟用（停用的工廠在所有情境中產出皆為 0）
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Plant {
    /// 創建新的工廠
    pub fn new(id: impl Into<String>, location: Location, annual_capacity: f64, unit_cost: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            location,
            annual_capacity,
            unit_cost,
            active: true,
        }
    }

    /// 建構器模式：設置名稱
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 建構器模式：設置啟用狀態
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// 配送中心
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionCenter {
    /// 配送中心ID
    pub id: String,

    /// 名稱
    #[serde(default)]
    pub name: String,

    /// 位置
    pub location: Location,

    /// 倉儲容量（單位，僅供報表參考，模型不設約束）
    pub storage_capacity: f64,

    /// 每月固定成本（EUR）
    pub fixed_monthly_cost: f64,

    /// 單位變動成本（EUR，按出貨量計）
    pub variable_unit_cost: f64,

    /// 區域
    #[serde(default)]
    pub region: Option<String>,
}

impl DistributionCenter {
    /// 創建新的配送中心
    pub fn new(
        id: impl Into<String>,
        location: Location,
        storage_capacity: f64,
        fixed_monthly_cost: f64,
        variable_unit_cost: f64,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            location,
            storage_capacity,
            fixed_monthly_cost,
            variable_unit_cost,
            region: None,
        }
    }

    /// 建構器模式：設置名稱
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 建構器模式：設置區域
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

/// 需求市場
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// 市場ID
    pub id: String,

    /// 名稱
    #[serde(default)]
    pub name: String,

    /// 位置
    pub location: Location,

    /// 年需求量（單位）
    pub annual_demand: f64,

    /// 單位營收（EUR）
    pub revenue_per_unit: f64,

    /// 季節性係數（年度模型不使用，保留供報表）
    #[serde(default = "default_seasonality")]
    pub seasonality_factor: f64,
}

fn default_seasonality() -> f64 {
    1.0
}

impl Market {
    /// 創建新的市場
    pub fn new(id: impl Into<String>, location: Location, annual_demand: f64, revenue_per_unit: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            location,
            annual_demand,
            revenue_per_unit,
            seasonality_factor: 1.0,
        }
    }

    /// 建構器模式：設置名稱
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 建構器模式：設置季節性係數
    pub fn with_seasonality(mut self, factor: f64) -> Self {
        self.seasonality_factor = factor;
        self
    }
}

/// 運輸方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// 公路
    Road,
    /// 海運
    Sea,
}

/// 路線類別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// 工廠 → 配送中心
    PlantToDc,
    /// 配送中心 → 市場
    DcToMarket,
}

/// 路線鍵（起點, 終點）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteKey {
    pub origin: String,
    pub destination: String,
}

impl RouteKey {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
        }
    }
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.origin, self.destination)
    }
}

/// 有向運輸路線
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// 起點ID
    pub origin: String,

    /// 終點ID
    pub destination: String,

    /// 路線類別
    pub class: RouteClass,

    /// 運輸方式
    pub mode: TransportMode,

    /// 單位運費（EUR）
    pub unit_cost: f64,

    /// 提前期（天）
    pub lead_time_days: f64,

    /// 距離（公里）
    #[serde(default)]
    pub distance_km: Option<f64>,

    /// 單位排放覆寫（kg CO2），未設定時使用運輸方式的排放係數
    #[serde(default)]
    pub co2_kg_per_unit: Option<f64>,
}

impl Route {
    /// 創建工廠 → 配送中心路線
    pub fn supply(
        plant_id: impl Into<String>,
        dc_id: impl Into<String>,
        mode: TransportMode,
        unit_cost: f64,
        lead_time_days: f64,
    ) -> Self {
        Self::new(plant_id, dc_id, RouteClass::PlantToDc, mode, unit_cost, lead_time_days)
    }

    /// 創建配送中心 → 市場路線
    pub fn delivery(
        dc_id: impl Into<String>,
        market_id: impl Into<String>,
        mode: TransportMode,
        unit_cost: f64,
        lead_time_days: f64,
    ) -> Self {
        Self::new(dc_id, market_id, RouteClass::DcToMarket, mode, unit_cost, lead_time_days)
    }

    fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        class: RouteClass,
        mode: TransportMode,
        unit_cost: f64,
        lead_time_days: f64,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            class,
            mode,
            unit_cost,
            lead_time_days,
            distance_km: None,
            co2_kg_per_unit: None,
        }
    }

    /// 建構器模式：設置距離
    pub fn with_distance_km(mut self, distance_km: f64) -> Self {
        self.distance_km = Some(distance_km);
        self
    }

    /// 建構器模式：設置單位排放
    pub fn with_co2_kg_per_unit(mut self, co2: f64) -> Self {
        self.co2_kg_per_unit = Some(co2);
        self
    }

    /// 路線鍵
    pub fn key(&self) -> RouteKey {
        RouteKey::new(self.origin.clone(), self.destination.clone())
    }
}
