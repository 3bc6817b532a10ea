use crate::domain::model::{Coordinate, LocationSource, UserLocation};
use crate::domain::ports::IpLocator;
use crate::utils::error::{MapError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_IP_LOOKUP_ENDPOINT: &str = "https://ipapi.co/json/";

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    country_name: Option<String>,
}

/// ipapi.co style lookup.
pub struct IpApiLocator {
    endpoint: String,
    client: Client,
}

impl IpApiLocator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl IpLocator for IpApiLocator {
    async fn locate(&self) -> Result<UserLocation> {
        let failed = |message: String| MapError::IpLookupFailed { message };

        tracing::debug!("Looking up location via {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("invalid response: {}", e)))?;

        // 服務被限流時會回傳沒有座標的 JSON
        let (Some(latitude), Some(longitude)) = (body.latitude, body.longitude) else {
            return Err(failed("response has no coordinates".to_string()));
        };

        Ok(UserLocation {
            coordinate: Coordinate::new(latitude, longitude),
            city: body.city,
            country: body.country_name,
            source: LocationSource::IpLookup,
        })
    }
}
