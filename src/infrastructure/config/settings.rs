//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; the backend API key is read
//! from the `ORDERSYNC_API_KEY` environment variable only.
//!
//! # Example
//!
//! ```no_run
//! use ordersync::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::backend::{BackendConfig, API_KEY_ENV};
use super::logging::LoggingConfig;
use super::newness::{NewnessConfig, NotificationsConfig};
use super::realtime::{RealtimeConfig, ReconnectionConfig};
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`]. Every section is optional except `backend.url`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Backend project endpoints and tables.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Live change-feed settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Retry policy for the live feed.
    #[serde(default)]
    pub reconnection: ReconnectionConfig,

    /// New-order highlight timing.
    #[serde(default)]
    pub newness: NewnessConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// Loads the API key from the environment before validating.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        // Never from the config file.
        config.backend.api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.backend.url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "backend.url" }.into());
        }
        if let Err(e) = url::Url::parse(&self.backend.url) {
            return Err(ConfigError::InvalidValue {
                field: "backend.url",
                reason: e.to_string(),
            }
            .into());
        }
        if self.backend.table.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "backend.table",
            }
            .into());
        }

        if self.realtime.heartbeat_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "heartbeat_interval_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.realtime.event_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_buffer",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.reconnection.base_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "base_delay_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.reconnection.max_delay_ms < self.reconnection.base_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "max_delay_ms",
                reason: "must be >= base_delay_ms".to_string(),
            }
            .into());
        }
        if self.reconnection.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_attempts",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.newness.expiry_ms == 0 || self.newness.auto_view_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "newness",
                reason: "expiry_ms and auto_view_ms must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
