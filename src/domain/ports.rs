use crate::domain::model::{
    Category, Coordinate, MarkerIcon, NotificationKind, OrgId, Organization, UserLocation,
    ViewportBounds,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Source of organizations for a bounding box.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn organizations_in(&self, bounds: &ViewportBounds) -> Result<Vec<Organization>>;
}

/// User-facing toast channel. Reusing a key replaces the earlier notification in place.
pub trait Notifier: Send + Sync {
    fn notify(&self, key: &str, kind: NotificationKind, message: &str);
    fn dismiss(&self, key: &str);
}

/// Everything a render layer needs to draw one organization marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub id: OrgId,
    pub coordinate: Coordinate,
    pub icon: MarkerIcon,
    pub popup: PopupContent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub title: String,
    pub category: Category,
    pub description: String,
    pub address: String,
    pub phone: String,
    pub hours: String,
    pub services: Vec<String>,
}

impl MarkerSpec {
    pub fn for_organization(org: &Organization) -> Self {
        Self {
            id: org.id.clone(),
            coordinate: org.coordinate,
            icon: org.category.icon(),
            popup: PopupContent {
                title: org.name.clone(),
                category: org.category,
                description: org.description.clone(),
                address: org.address.clone(),
                phone: org.phone.clone(),
                hours: org.hours.clone(),
                services: org.services.clone(),
            },
        }
    }
}

/// Mapping/clustering library handle. Owned once by the sync loop.
pub trait RenderLayer {
    type Handle;

    fn set_view(&mut self, center: Coordinate, zoom: u8);
    fn add_marker(&mut self, spec: &MarkerSpec) -> Result<Self::Handle>;
    fn remove_marker(&mut self, id: &OrgId, handle: Self::Handle);
    fn recompute_clusters(&mut self);
    fn fit_bounds(&mut self, bounds: &ViewportBounds);
    fn show_user_location(&mut self, location: &UserLocation);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorOptions {
    pub timeout: Duration,
    pub high_accuracy: bool,
    /// 可接受的快取定位時間，0 表示不接受快取
    pub maximum_age: Duration,
}

impl Default for SensorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            high_accuracy: true,
            maximum_age: Duration::ZERO,
        }
    }
}

#[async_trait]
pub trait LocationSensor: Send + Sync {
    fn is_available(&self) -> bool;
    async fn current_position(&self, options: &SensorOptions) -> Result<Coordinate>;
}

#[async_trait]
pub trait IpLocator: Send + Sync {
    async fn locate(&self) -> Result<UserLocation>;
}

pub trait ConfigProvider: Send + Sync {
    fn store_endpoint(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn debounce(&self) -> Duration;
    fn default_center(&self) -> Coordinate;
    fn default_zoom(&self) -> u8;
    fn user_zoom(&self) -> u8;
    fn location_enabled(&self) -> bool;
    fn sensor_timeout(&self) -> Duration;
    fn ip_lookup_endpoint(&self) -> &str;
    fn initial_categories(&self) -> Vec<Category>;
}
