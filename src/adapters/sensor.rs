use crate::domain::model::Coordinate;
use crate::domain::ports::{LocationSensor, SensorOptions};
use crate::utils::error::{MapError, Result};
use async_trait::async_trait;

/// A host without a geolocation sensor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSensor;

#[async_trait]
impl LocationSensor for NoSensor {
    fn is_available(&self) -> bool {
        false
    }

    async fn current_position(&self, _options: &SensorOptions) -> Result<Coordinate> {
        Err(MapError::SensorUnavailable)
    }
}

/// Sensor that always reports the same fix, e.g. from `--lat/--lon`.
#[derive(Debug, Clone, Copy)]
pub struct FixedSensor {
    coordinate: Coordinate,
}

impl FixedSensor {
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl LocationSensor for FixedSensor {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self, _options: &SensorOptions) -> Result<Coordinate> {
        Ok(self.coordinate)
    }
}
