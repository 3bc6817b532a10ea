use crate::domain::model::{Coordinate, NotificationKind, UserLocation};
use crate::domain::ports::{IpLocator, LocationSensor, Notifier, SensorOptions};
use crate::utils::error::{MapError, Result};
use std::sync::Arc;
use tokio::sync::{watch, OnceCell};

const SENSOR_TOAST: &str = "location-sensor";
const IP_TOAST: &str = "location-ip";

/// Session-scoped holder of the user's location.
///
/// Created once at session start and passed to whoever needs it. Consumers read
/// or subscribe; only [`LocationDetector`] writes.
#[derive(Debug, Clone)]
pub struct LocationProvider {
    tx: Arc<watch::Sender<Option<UserLocation>>>,
}

impl LocationProvider {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Option<UserLocation> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UserLocation>> {
        self.tx.subscribe()
    }

    pub(crate) fn publish(&self, location: UserLocation) {
        self.tx.send_replace(Some(location));
    }

    pub(crate) fn clear(&self) {
        self.tx.send_replace(None);
    }
}

impl Default for LocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot best-effort location acquisition: sensor first, IP lookup as fallback.
pub struct LocationDetector<S: LocationSensor, I: IpLocator, N: Notifier> {
    sensor: S,
    ip_locator: I,
    notifier: Arc<N>,
    provider: LocationProvider,
    options: SensorOptions,
    outcome: OnceCell<Option<UserLocation>>,
}

impl<S: LocationSensor, I: IpLocator, N: Notifier> LocationDetector<S, I, N> {
    pub fn new(sensor: S, ip_locator: I, notifier: Arc<N>, provider: LocationProvider) -> Self {
        Self {
            sensor,
            ip_locator,
            notifier,
            provider,
            options: SensorOptions::default(),
            outcome: OnceCell::new(),
        }
    }

    pub fn with_options(mut self, options: SensorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn provider(&self) -> &LocationProvider {
        &self.provider
    }

    pub fn has_run(&self) -> bool {
        self.outcome.initialized()
    }

    /// Runs detection on the first call only; later calls return the same outcome.
    pub async fn detect(&self) -> Option<UserLocation> {
        self.outcome
            .get_or_init(|| self.run_detection())
            .await
            .clone()
    }

    async fn run_detection(&self) -> Option<UserLocation> {
        self.provider.clear();

        if !self.sensor.is_available() {
            tracing::info!("Location sensor unavailable, using IP-based detection");
            return self.detect_via_ip("Failed to detect location").await;
        }

        self.notifier.notify(
            SENSOR_TOAST,
            NotificationKind::Loading,
            "Requesting location permission...",
        );

        match self.read_sensor().await {
            Ok(coordinate) => {
                let location = UserLocation::from_sensor(coordinate);
                tracing::info!(
                    "📍 Location detected from sensor: {:.4}, {:.4}",
                    coordinate.latitude,
                    coordinate.longitude
                );
                self.provider.publish(location.clone());
                self.notifier.notify(
                    SENSOR_TOAST,
                    NotificationKind::Success,
                    "Location detected successfully!",
                );
                Some(location)
            }
            Err(e) => {
                tracing::warn!("Sensor location failed: {}", e);
                self.notifier.notify(
                    SENSOR_TOAST,
                    NotificationKind::Error,
                    "Location permission denied. Trying IP-based detection...",
                );
                self.detect_via_ip("Failed to detect location via IP").await
            }
        }
    }

    async fn read_sensor(&self) -> Result<Coordinate> {
        let timeout = self.options.timeout;
        let coordinate = tokio::time::timeout(timeout, self.sensor.current_position(&self.options))
            .await
            .map_err(|_| MapError::SensorTimeout {
                timeout_ms: timeout.as_millis() as u64,
            })??;

        if !coordinate.is_valid() {
            return Err(MapError::SensorDenied {
                message: format!(
                    "sensor reported invalid coordinate {}, {}",
                    coordinate.latitude, coordinate.longitude
                ),
            });
        }
        Ok(coordinate)
    }

    async fn detect_via_ip(&self, failure_message: &str) -> Option<UserLocation> {
        self.notifier.notify(
            IP_TOAST,
            NotificationKind::Loading,
            "Detecting location via IP...",
        );

        match self.ip_locator.locate().await {
            Ok(location) if location.coordinate.is_valid() => {
                let message = format!(
                    "Location detected via IP: {}, {}",
                    location.city.as_deref().unwrap_or("unknown city"),
                    location.country.as_deref().unwrap_or("unknown country")
                );
                tracing::info!("📍 {}", message);
                self.provider.publish(location.clone());
                self.notifier
                    .notify(IP_TOAST, NotificationKind::Success, &message);
                Some(location)
            }
            Ok(location) => {
                tracing::warn!(
                    "IP lookup returned invalid coordinate {:?}, keeping default center",
                    location.coordinate
                );
                self.notifier
                    .notify(IP_TOAST, NotificationKind::Error, failure_message);
                None
            }
            Err(e) => {
                tracing::warn!("IP-based location failed: {}", e);
                self.notifier
                    .notify(IP_TOAST, NotificationKind::Error, failure_message);
                None
            }
        }
    }
}
