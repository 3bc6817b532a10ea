use crate::domain::model::{Organization, ViewportBounds};
use crate::domain::ports::OrganizationStore;
use crate::utils::error::{MapError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

const BUNDLED_ORGANIZATIONS: &str = include_str!("../data/organizations.json");

/// Organization list held in memory; also backs the `org_server` endpoint.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    organizations: Vec<Organization>,
}

impl InMemoryStore {
    pub fn new(organizations: Vec<Organization>) -> Self {
        Self { organizations }
    }

    /// 內建的示範資料（紐約十間工具店）
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_ORGANIZATIONS)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let organizations: Vec<Organization> = serde_json::from_str(content)?;
        let mut seen = HashSet::with_capacity(organizations.len());
        for org in &organizations {
            if !seen.insert(&org.id) {
                return Err(MapError::ConfigValidationError {
                    field: format!("organizations[{}]", org.id),
                    message: format!("duplicate organization id '{}'", org.id),
                });
            }
            if !org.coordinate.is_valid() {
                return Err(MapError::ConfigValidationError {
                    field: format!("organizations[{}]", org.id),
                    message: format!(
                        "coordinate {}, {} out of range",
                        org.coordinate.latitude, org.coordinate.longitude
                    ),
                });
            }
        }
        Ok(Self::new(organizations))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn all(&self) -> &[Organization] {
        &self.organizations
    }

    pub fn len(&self) -> usize {
        self.organizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty()
    }

    /// Organizations inside `bounds`, edges inclusive.
    pub fn query(&self, bounds: &ViewportBounds) -> Vec<Organization> {
        self.organizations
            .iter()
            .filter(|org| bounds.contains(&org.coordinate))
            .cloned()
            .collect()
    }

    /// Query with a raw `bounds` parameter. Missing or malformed bounds return everything.
    pub fn query_raw(&self, raw: Option<&str>) -> Vec<Organization> {
        let Some(raw) = raw else {
            return self.organizations.clone();
        };

        match raw.parse::<ViewportBounds>() {
            Ok(bounds) => self.query(&bounds),
            Err(e) => {
                tracing::warn!("{}; returning all organizations", e);
                self.organizations.clone()
            }
        }
    }
}

#[async_trait]
impl OrganizationStore for InMemoryStore {
    async fn organizations_in(&self, bounds: &ViewportBounds) -> Result<Vec<Organization>> {
        Ok(self.query(bounds))
    }
}
