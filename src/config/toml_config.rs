use crate::adapters::ip_locator::DEFAULT_IP_LOOKUP_ENDPOINT;
use crate::core::viewport_sync::{DEFAULT_CENTER, DEFAULT_ZOOM};
use crate::domain::model::{Category, Coordinate};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MapError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_STORE_ENDPOINT: &str = "http://localhost:3000/api/organizations";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_endpoint")]
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
}

fn default_store_endpoint() -> String {
    DEFAULT_STORE_ENDPOINT.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_store_endpoint(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    pub debounce_ms: Option<u64>,
    pub default_latitude: Option<f64>,
    pub default_longitude: Option<f64>,
    pub default_zoom: Option<u8>,
    pub user_zoom: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    pub enabled: Option<bool>,
    pub sensor_timeout_ms: Option<u64>,
    pub ip_lookup_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// 未設定時預設全部類別
    pub categories: Option<Vec<Category>>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MapError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MapError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ORGMAP_ENDPOINT})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MapError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("store.endpoint", &self.store.endpoint)?;
        if let Some(timeout) = self.store.timeout_seconds {
            validation::validate_range("store.timeout_seconds", timeout, 1, 300)?;
        }

        if let Some(debounce) = self.sync.debounce_ms {
            validation::validate_range("sync.debounce_ms", debounce, 0, 60_000)?;
        }
        if let Some(lat) = self.sync.default_latitude {
            validation::validate_latitude("sync.default_latitude", lat)?;
        }
        if let Some(lon) = self.sync.default_longitude {
            validation::validate_longitude("sync.default_longitude", lon)?;
        }
        if let Some(zoom) = self.sync.default_zoom {
            validation::validate_range("sync.default_zoom", zoom, 1, 19)?;
        }
        if let Some(zoom) = self.sync.user_zoom {
            validation::validate_range("sync.user_zoom", zoom, 1, 19)?;
        }

        if let Some(timeout) = self.location.sensor_timeout_ms {
            validation::validate_range("location.sensor_timeout_ms", timeout, 1, 60_000)?;
        }
        if let Some(endpoint) = &self.location.ip_lookup_endpoint {
            validation::validate_url("location.ip_lookup_endpoint", endpoint)?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn store_endpoint(&self) -> &str {
        &self.store.endpoint
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.store.timeout_seconds.unwrap_or(10))
    }

    fn debounce(&self) -> Duration {
        Duration::from_millis(self.sync.debounce_ms.unwrap_or(1000))
    }

    fn default_center(&self) -> Coordinate {
        Coordinate::new(
            self.sync.default_latitude.unwrap_or(DEFAULT_CENTER.latitude),
            self.sync.default_longitude.unwrap_or(DEFAULT_CENTER.longitude),
        )
    }

    fn default_zoom(&self) -> u8 {
        self.sync.default_zoom.unwrap_or(DEFAULT_ZOOM)
    }

    fn user_zoom(&self) -> u8 {
        self.sync.user_zoom.unwrap_or(DEFAULT_ZOOM)
    }

    fn location_enabled(&self) -> bool {
        self.location.enabled.unwrap_or(true)
    }

    fn sensor_timeout(&self) -> Duration {
        Duration::from_millis(self.location.sensor_timeout_ms.unwrap_or(5000))
    }

    fn ip_lookup_endpoint(&self) -> &str {
        self.location
            .ip_lookup_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_IP_LOOKUP_ENDPOINT)
    }

    fn initial_categories(&self) -> Vec<Category> {
        self.filter
            .categories
            .clone()
            .unwrap_or_else(|| Category::ALL.to_vec())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
