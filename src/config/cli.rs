use crate::config::toml_config::TomlConfig;
use crate::domain::model::Coordinate;
use crate::utils::error::{MapError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "orgmap")]
#[command(about = "Headless organization map: viewport sync driven from stdin")]
pub struct CliConfig {
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Organization endpoint (overrides store.endpoint)")]
    pub endpoint: Option<String>,

    #[arg(long, help = "Serve the bundled dataset instead of calling the endpoint")]
    pub offline: bool,

    #[arg(long, help = "Quiet period before fetching, in milliseconds")]
    pub debounce_ms: Option<u64>,

    #[arg(long, help = "Skip location detection")]
    pub no_location: bool,

    #[arg(long, requires = "lon", allow_hyphen_values = true, help = "Fixed sensor latitude")]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true, help = "Fixed sensor longitude")]
    pub lon: Option<f64>,

    #[arg(long, help = "Initial categories, separated by '|' (empty selects none)")]
    pub categories: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Loads the TOML file (if any) and applies the command line overrides.
    pub fn load(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(endpoint) = &self.endpoint {
            config.store.endpoint = endpoint.clone();
        }
        if let Some(debounce) = self.debounce_ms {
            config.sync.debounce_ms = Some(debounce);
        }
        if self.no_location {
            config.location.enabled = Some(false);
        }
        if let Some(raw) = &self.categories {
            let selection = crate::core::filter::CategorySelection::parse_list(raw)?;
            config.filter.categories = Some(selection.iter().collect());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn sensor_fix(&self) -> Option<Coordinate> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            validation::validate_url("--endpoint", endpoint)?;
        }
        if let Some(fix) = self.sensor_fix() {
            validation::validate_latitude("--lat", fix.latitude)?;
            validation::validate_longitude("--lon", fix.longitude)?;
        }
        if let Some(path) = &self.config {
            validation::validate_non_empty_string("--config", path)?;
        }
        if self.offline && self.endpoint.is_some() {
            return Err(MapError::ConfigError {
                message: "--offline and --endpoint cannot be combined".to_string(),
            });
        }
        Ok(())
    }
}
