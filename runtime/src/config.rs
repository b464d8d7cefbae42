//! Service configuration from environment variables or TOML.
//!
//! # Environment Variables
//!
//! | Variable                  | Meaning                                   | Default            |
//! |---------------------------|-------------------------------------------|--------------------|
//! | `CROSSCUT_ENV`            | `development`, `staging`, `production`    | `development`      |
//! | `CROSSCUT_LOG_LEVEL`      | framework/file log level                  | preset minimum     |
//! | `CROSSCUT_LOG_FILE`       | log file path                             | none               |
//! | `CROSSCUT_RETRY_MAX`      | retries after the first attempt           | `3`                |
//! | `CROSSCUT_RETRY_UNIT_MS`  | backoff unit in milliseconds              | `1000`             |
//!
//! # Example
//!
//! ```
//! use crosscut_runtime::config::{Environment, ServiceConfig};
//!
//! let config = ServiceConfig::from_toml_str(
//!     r#"
//!     environment = "production"
//!
//!     [logging]
//!     level = "error"
//!
//!     [retry]
//!     max_retries = 5
//!     backoff_unit_ms = 250
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.environment, Environment::Production);
//! assert_eq!(config.retry_policy().max_retries, 5);
//! ```

use crate::logging::{LogConfig, LogFormat, LogLevel, LogPreset};
use crate::retry::{RetryPolicy, DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_RETRIES};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration error
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid environment value
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment (local)
    #[default]
    Development,
    /// Staging environment (pre-production)
    Staging,
    /// Production environment
    Production,
}

impl Environment {
    /// Get environment from string
    ///
    /// # Errors
    ///
    /// Returns error if environment string is invalid
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Development),
            "staging" | "stage" => Ok(Self::Staging),
            "prod" | "production" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }

    /// Logger preset used in this environment
    #[must_use]
    pub const fn log_preset(self) -> LogPreset {
        match self {
            Self::Development => LogPreset::Debug,
            Self::Staging | Self::Production => LogPreset::Production,
        }
    }

    /// Check if this is production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Framework/file level; the preset minimum when absent
    pub level: Option<LogLevel>,
    /// Log file path
    pub file: Option<PathBuf>,
    /// Colour console output
    pub ansi: Option<bool>,
    /// Line layout for console and file output
    pub format: Option<LogFormat>,
}

/// Retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Backoff unit in milliseconds
    pub backoff_unit_ms: u64,
}

impl RetrySettings {
    /// Validate retry settings
    ///
    /// # Errors
    ///
    /// Returns error if the backoff unit is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backoff_unit_ms == 0 {
            return Err(ConfigError::ValidationError(
                "backoff_unit_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Get backoff unit as Duration
    #[must_use]
    pub const fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_unit_ms: u64::try_from(DEFAULT_BACKOFF_UNIT.as_millis()).unwrap_or(1000),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Logging settings
    pub logging: LoggingSettings,
    /// Retry settings
    pub retry: RetrySettings,
}

impl ServiceConfig {
    /// Defaults for a specific environment
    #[must_use]
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            logging: LoggingSettings {
                ansi: Some(!environment.is_production()),
                ..LoggingSettings::default()
            },
            retry: RetrySettings::default(),
        }
    }

    /// Load configuration from `CROSSCUT_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or the result is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup function
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or the result is invalid
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("CROSSCUT_ENV")
            .map(|value| Environment::parse(&value))
            .transpose()?
            .unwrap_or_default();
        let mut config = Self::for_environment(environment);

        if let Some(level) = lookup("CROSSCUT_LOG_LEVEL") {
            config.logging.level = Some(
                level
                    .parse()
                    .map_err(|e| ConfigError::ParseError(format!("CROSSCUT_LOG_LEVEL: {e}")))?,
            );
        }
        if let Some(format) = lookup("CROSSCUT_LOG_FORMAT") {
            config.logging.format = Some(
                format
                    .parse()
                    .map_err(|e| ConfigError::ParseError(format!("CROSSCUT_LOG_FORMAT: {e}")))?,
            );
        }
        if let Some(file) = lookup("CROSSCUT_LOG_FILE").filter(|f| !f.trim().is_empty()) {
            config.logging.file = Some(PathBuf::from(file));
        }
        if let Some(max) = lookup("CROSSCUT_RETRY_MAX") {
            config.retry.max_retries = parse_number("CROSSCUT_RETRY_MAX", &max)?;
        }
        if let Some(unit) = lookup("CROSSCUT_RETRY_UNIT_MS") {
            config.retry.backoff_unit_ms = parse_number("CROSSCUT_RETRY_UNIT_MS", &unit)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML
    ///
    /// # Errors
    ///
    /// Returns error if the TOML is malformed or the result is invalid
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the whole configuration
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry.validate()
    }

    /// Logger configuration for this service
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::for_preset(self.environment.log_preset());
        if let Some(level) = self.logging.level {
            config = config.with_framework_level(level);
        }
        if let Some(file) = &self.logging.file {
            config = config.with_file(file.clone());
        }
        if let Some(ansi) = self.logging.ansi {
            config = config.with_ansi(ansi);
        }
        if let Some(format) = self.logging.format {
            config = config
                .with_console_format(format)
                .with_file_format(format);
        }
        config
    }

    /// Retry policy for this service (every fault retryable)
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(self.retry.max_retries)
            .backoff_unit(self.retry.backoff_unit())
            .build()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::ParseError(format!("{key}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_to_development() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.log_config().preset, LogPreset::Debug);
        assert_eq!(config.retry_policy().max_retries, 3);
        assert_eq!(config.retry_policy().backoff_unit, Duration::from_secs(1));
    }

    #[test]
    fn test_production_from_env_vars() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("CROSSCUT_ENV", "prod"),
            ("CROSSCUT_LOG_LEVEL", "error"),
            ("CROSSCUT_LOG_FILE", "logs/api.log"),
            ("CROSSCUT_LOG_FORMAT", "compact"),
            ("CROSSCUT_RETRY_MAX", "5"),
        ]))
        .unwrap();

        let log = config.log_config();
        assert_eq!(log.preset, LogPreset::Production);
        assert_eq!(log.framework_level, LogLevel::Error);
        assert_eq!(log.file, Some(PathBuf::from("logs/api.log")));
        assert!(!log.ansi);
        assert_eq!(log.console_format, LogFormat::Compact);
        assert_eq!(log.file_format, LogFormat::Compact);
        assert_eq!(config.retry_policy().max_retries, 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ServiceConfig::from_lookup(lookup(&[("CROSSCUT_ENV", "moon")])),
            Err(ConfigError::InvalidEnvironment(_))
        ));
        assert!(matches!(
            ServiceConfig::from_lookup(lookup(&[("CROSSCUT_RETRY_MAX", "many")])),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            ServiceConfig::from_lookup(lookup(&[("CROSSCUT_RETRY_UNIT_MS", "0")])),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_toml_partial_sections_use_defaults() {
        let config = ServiceConfig::from_toml_str("environment = \"staging\"").unwrap();
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.retry, RetrySettings::default());
        assert!(ServiceConfig::from_toml_str("environment = 3").is_err());
    }
}
