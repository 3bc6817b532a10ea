use crate::domain::model::{Organization, ViewportBounds};
use crate::domain::ports::OrganizationStore;
use crate::utils::error::{MapError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Client for `GET organizations?bounds=south,west,north,east`.
pub struct HttpOrganizationStore {
    endpoint: String,
    client: Client,
}

impl HttpOrganizationStore {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches the full collection without a bounds filter.
    pub async fn all(&self) -> Result<Vec<Organization>> {
        tracing::debug!("Making API request to: {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await;
        Self::decode(response).await
    }

    async fn decode(
        response: std::result::Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Vec<Organization>> {
        let response = response.map_err(|e| MapError::FetchFailed {
            message: e.to_string(),
        })?;

        tracing::debug!("API response status: {}", response.status());
        if !response.status().is_success() {
            return Err(MapError::FetchFailed {
                message: format!("HTTP {}", response.status()),
            });
        }

        let organizations = response
            .json::<Vec<Organization>>()
            .await
            .map_err(|e| MapError::FetchFailed {
                message: format!("invalid organization payload: {}", e),
            })?;

        // 一筆座標錯誤就整批拒收，保留上一次的結果
        if let Some(bad) = organizations.iter().find(|org| !org.coordinate.is_valid()) {
            return Err(MapError::FetchFailed {
                message: format!(
                    "organization {} has out-of-range coordinate {}, {}",
                    bad.id, bad.coordinate.latitude, bad.coordinate.longitude
                ),
            });
        }
        Ok(organizations)
    }
}

#[async_trait]
impl OrganizationStore for HttpOrganizationStore {
    async fn organizations_in(&self, bounds: &ViewportBounds) -> Result<Vec<Organization>> {
        tracing::debug!(
            "Making API request to: {}?bounds={}",
            self.endpoint,
            bounds
        );
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("bounds", bounds.to_query_param())])
            .send()
            .await;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn store(server: &MockServer) -> HttpOrganizationStore {
        HttpOrganizationStore::new(server.url("/api/organizations"), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_sends_bounds_query_param() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/organizations")
                .query_param("bounds", "40.7,-74.02,40.72,-74");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([
                    {
                        "id": "1",
                        "name": "Tool Depot - Manhattan",
                        "category": "Retail Store",
                        "latitude": 40.7128,
                        "longitude": -74.006,
                        "description": "Full-service tool retailer",
                        "address": "123 Broadway, New York, NY 10001",
                        "phone": "(212) 555-1001",
                        "hours": "Mon-Fri: 8AM-8PM",
                        "services": ["Tool Sales"]
                    }
                ]));
        });

        let bounds: ViewportBounds = "40.70,-74.02,40.72,-74.00".parse().unwrap();
        let result = store(&server).organizations_in(&bounds).await.unwrap();

        api_mock.assert();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Tool Depot - Manhattan");
    }

    #[tokio::test]
    async fn test_server_error_is_fetch_failure() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/api/organizations");
            then.status(500);
        });

        let bounds = ViewportBounds::new(40.7, -74.02, 40.72, -74.0).unwrap();
        let err = store(&server).organizations_in(&bounds).await.unwrap_err();

        api_mock.assert();
        assert!(matches!(err, MapError::FetchFailed { .. }));
    }

    #[tokio::test]
    async fn test_bad_payload_is_fetch_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/organizations");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"error": "nope"}));
        });

        let err = store(&server).all().await.unwrap_err();
        assert!(matches!(err, MapError::FetchFailed { message } if message.contains("payload")));
    }

    #[tokio::test]
    async fn test_out_of_range_coordinate_is_fetch_failure() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/api/organizations");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([
                    {
                        "id": "x",
                        "name": "Nowhere Tools",
                        "category": "Boutique",
                        "latitude": 200.0,
                        "longitude": 999.0
                    }
                ]));
        });

        let bounds = ViewportBounds::new(40.7, -74.02, 40.72, -74.0).unwrap();
        let err = store(&server).organizations_in(&bounds).await.unwrap_err();

        api_mock.assert();
        assert!(matches!(err, MapError::FetchFailed { message } if message.contains("organization x")));
    }
}
