use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Location permission denied: {message}")]
    SensorDenied { message: String },

    #[error("Location sensor timed out after {timeout_ms} ms")]
    SensorTimeout { timeout_ms: u64 },

    #[error("Location sensor is not available")]
    SensorUnavailable,

    #[error("IP-based location lookup failed: {message}")]
    IpLookupFailed { message: String },

    #[error("Failed to fetch organizations: {message}")]
    FetchFailed { message: String },

    #[error("Malformed bounds '{value}': {reason}")]
    MalformedBounds { value: String, reason: String },

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Location,
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MapError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MapError::SensorDenied { .. }
            | MapError::SensorTimeout { .. }
            | MapError::SensorUnavailable
            | MapError::IpLookupFailed { .. } => ErrorCategory::Location,
            MapError::FetchFailed { .. } | MapError::Http(_) => ErrorCategory::Network,
            MapError::MalformedBounds { .. }
            | MapError::UnknownCategory(_)
            | MapError::SerializationError(_) => ErrorCategory::Data,
            MapError::ConfigError { .. }
            | MapError::ConfigValidationError { .. }
            | MapError::InvalidConfigValueError { .. }
            | MapError::MissingConfigError { .. } => ErrorCategory::Configuration,
            MapError::IoError(_) => ErrorCategory::System,
        }
    }

    /// 地圖子系統的錯誤皆可恢復，只有配置與系統錯誤會讓 CLI 退出
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Location => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Data => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity() <= ErrorSeverity::Medium
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MapError::SensorDenied { .. } => {
                "Location permission denied. Trying IP-based detection...".to_string()
            }
            MapError::SensorTimeout { .. } | MapError::SensorUnavailable => {
                "Could not read your location from this device".to_string()
            }
            MapError::IpLookupFailed { .. } => "Failed to detect location via IP".to_string(),
            MapError::FetchFailed { .. } | MapError::Http(_) => {
                "Failed to load organizations".to_string()
            }
            MapError::MalformedBounds { value, .. } => {
                format!("Ignoring malformed map bounds: {}", value)
            }
            MapError::UnknownCategory(name) => format!("Unknown category: {}", name),
            MapError::ConfigError { message } => format!("Configuration problem: {}", message),
            MapError::ConfigValidationError { field, message } => {
                format!("Invalid configuration for {}: {}", field, message)
            }
            MapError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid configuration for {}: {}", field, reason)
            }
            MapError::MissingConfigError { field } => {
                format!("Missing required configuration: {}", field)
            }
            MapError::IoError(e) => format!("File system error: {}", e),
            MapError::SerializationError(e) => format!("Unexpected data format: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Location => "The map will use its default center; try recenter later",
            ErrorCategory::Network => "Check the organization endpoint and your network connection",
            ErrorCategory::Data => "Check the data returned by the organization endpoint",
            ErrorCategory::Configuration => "Review the configuration file and command line flags",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_errors_are_low_severity() {
        let err = MapError::SensorTimeout { timeout_ms: 5000 };
        assert_eq!(err.category(), ErrorCategory::Location);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_fetch_failure_is_recoverable() {
        let err = MapError::FetchFailed {
            message: "500".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_recoverable());
        assert_eq!(err.user_friendly_message(), "Failed to load organizations");
    }

    #[test]
    fn test_config_errors_are_not_recoverable() {
        let err = MapError::MissingConfigError {
            field: "store.endpoint".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(!err.is_recoverable());
    }
}
