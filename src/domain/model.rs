use crate::utils::error::MapError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(pub String);

impl OrgId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    #[serde(rename = "Retail Store")]
    RetailStore,
    #[serde(rename = "Outlet Store")]
    OutletStore,
    #[serde(rename = "Pop-up Shop")]
    PopUpShop,
    #[serde(rename = "Flagship Store")]
    FlagshipStore,
    #[serde(rename = "Department Store")]
    DepartmentStore,
    #[serde(rename = "Specialty Store")]
    SpecialtyStore,
    Boutique,
    #[serde(rename = "Convenience Store")]
    ConvenienceStore,
    Supermarket,
    #[serde(rename = "Shopping Mall")]
    ShoppingMall,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::RetailStore,
        Category::OutletStore,
        Category::PopUpShop,
        Category::FlagshipStore,
        Category::DepartmentStore,
        Category::SpecialtyStore,
        Category::Boutique,
        Category::ConvenienceStore,
        Category::Supermarket,
        Category::ShoppingMall,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::RetailStore => "Retail Store",
            Category::OutletStore => "Outlet Store",
            Category::PopUpShop => "Pop-up Shop",
            Category::FlagshipStore => "Flagship Store",
            Category::DepartmentStore => "Department Store",
            Category::SpecialtyStore => "Specialty Store",
            Category::Boutique => "Boutique",
            Category::ConvenienceStore => "Convenience Store",
            Category::Supermarket => "Supermarket",
            Category::ShoppingMall => "Shopping Mall",
        }
    }

    pub fn icon(&self) -> MarkerIcon {
        match self {
            Category::RetailStore => MarkerIcon::Store,
            Category::OutletStore => MarkerIcon::ShoppingBag,
            Category::PopUpShop | Category::ShoppingMall => MarkerIcon::StoreAlt,
            Category::FlagshipStore => MarkerIcon::Building,
            Category::DepartmentStore => MarkerIcon::ShoppingCart,
            Category::SpecialtyStore => MarkerIcon::Tshirt,
            Category::Boutique => MarkerIcon::Gem,
            Category::ConvenienceStore => MarkerIcon::ShoppingBasket,
            Category::Supermarket => MarkerIcon::CartPlus,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MapError::UnknownCategory(wanted.to_string()))
    }
}

// 與 FromStr 相同規則：不分大小寫
impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(de::Error::custom)
    }
}

/// 地圖標記使用的圖示資產
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerIcon {
    Store,
    ShoppingBag,
    StoreAlt,
    Building,
    ShoppingCart,
    Tshirt,
    Gem,
    ShoppingBasket,
    CartPlus,
    UserLocation,
}

impl MarkerIcon {
    pub fn asset_name(&self) -> &'static str {
        match self {
            MarkerIcon::Store => "store",
            MarkerIcon::ShoppingBag => "shopping-bag",
            MarkerIcon::StoreAlt => "store-alt",
            MarkerIcon::Building => "building",
            MarkerIcon::ShoppingCart => "shopping-cart",
            MarkerIcon::Tshirt => "tshirt",
            MarkerIcon::Gem => "gem",
            MarkerIcon::ShoppingBasket => "shopping-basket",
            MarkerIcon::CartPlus => "cart-plus",
            MarkerIcon::UserLocation => "map-marker-alt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
    pub category: Category,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub hours: String,
    #[serde(default)]
    pub services: Vec<String>,
}

/// South/west/north/east rectangle. Never wraps the antimeridian.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "BoundsFields")]
pub struct ViewportBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

#[derive(Deserialize)]
struct BoundsFields {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

impl TryFrom<BoundsFields> for ViewportBounds {
    type Error = MapError;

    fn try_from(fields: BoundsFields) -> Result<Self, Self::Error> {
        Self::new(fields.south, fields.west, fields.north, fields.east)
    }
}

impl ViewportBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> crate::utils::error::Result<Self> {
        let bounds = Self {
            south,
            west,
            north,
            east,
        };
        bounds.check().map_err(|reason| MapError::MalformedBounds {
            value: bounds.to_query_param(),
            reason,
        })?;
        Ok(bounds)
    }

    fn check(&self) -> Result<(), String> {
        let values = [self.south, self.west, self.north, self.east];
        if values.iter().any(|v| !v.is_finite()) {
            return Err("coordinates must be finite numbers".to_string());
        }
        if !(-90.0..=90.0).contains(&self.south) || !(-90.0..=90.0).contains(&self.north) {
            return Err("latitude out of range [-90, 90]".to_string());
        }
        if !(-180.0..=180.0).contains(&self.west) || !(-180.0..=180.0).contains(&self.east) {
            return Err("longitude out of range [-180, 180]".to_string());
        }
        if self.south > self.north {
            return Err("south must not exceed north".to_string());
        }
        if self.west > self.east {
            return Err("west must not exceed east".to_string());
        }
        Ok(())
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        point.latitude >= self.south
            && point.latitude <= self.north
            && point.longitude >= self.west
            && point.longitude <= self.east
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// `south,west,north,east`，與 `bounds` 查詢參數格式一致
    pub fn to_query_param(&self) -> String {
        format!("{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}

// Bit-for-bit: 0.0 and -0.0 are different requests.
impl PartialEq for ViewportBounds {
    fn eq(&self, other: &Self) -> bool {
        self.south.to_bits() == other.south.to_bits()
            && self.west.to_bits() == other.west.to_bits()
            && self.north.to_bits() == other.north.to_bits()
            && self.east.to_bits() == other.east.to_bits()
    }
}

impl Eq for ViewportBounds {}

impl fmt::Display for ViewportBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_param())
    }
}

impl FromStr for ViewportBounds {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: String| MapError::MalformedBounds {
            value: s.to_string(),
            reason,
        };

        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(malformed(format!(
                "expected 4 comma-separated numbers, got {}",
                parts.len()
            )));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse::<f64>()
                .map_err(|e| malformed(format!("'{}' is not a number: {}", part, e)))?;
        }

        let bounds = Self {
            south: values[0],
            west: values[1],
            north: values[2],
            east: values[3],
        };
        bounds.check().map_err(malformed)?;
        Ok(bounds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationSource {
    Sensor,
    IpLookup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub coordinate: Coordinate,
    pub city: Option<String>,
    pub country: Option<String>,
    pub source: LocationSource,
}

impl UserLocation {
    pub fn from_sensor(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            city: None,
            country: None,
            source: LocationSource::Sensor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub key: String,
    pub kind: NotificationKind,
    pub message: String,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
