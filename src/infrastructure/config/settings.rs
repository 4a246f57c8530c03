//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application
//! settings. Configuration is loaded from a TOML file; the database path
//! may be overridden through the `TOTE_DATABASE` environment variable so
//! deployments can relocate the ledger without editing the file.
//!
//! # Example
//!
//! ```no_run
//! use tote::infrastructure::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use crate::application::EconomyConfig;
use crate::error::{ConfigError, Result};

/// Where the ledger lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "tote.db".to_string(),
        }
    }
}

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ledger database settings.
    pub database: DatabaseConfig,

    /// Logging and tracing configuration.
    pub logging: LoggingConfig,

    /// Coin-economy knobs: starting balance and minimum stake.
    pub economy: EconomyConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation
    /// fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        if let Ok(path) = std::env::var("TOTE_DATABASE") {
            config.database.path = path;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, or defaults when the file does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            let mut config = Self::default();
            if let Ok(path) = std::env::var("TOTE_DATABASE") {
                config.database.path = path;
            }
            config.validate()?;
            return Ok(config);
        }
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.database.path.is_empty() {
            return Err(ConfigError::MissingField {
                field: "database.path",
            }
            .into());
        }
        if self.economy.starting_balance < 0 {
            return Err(ConfigError::InvalidValue {
                field: "economy.starting_balance",
                reason: "must be 0 or greater".to_string(),
            }
            .into());
        }
        if self.economy.min_wager < 1 {
            return Err(ConfigError::InvalidValue {
                field: "economy.min_wager",
                reason: "must be at least 1".to_string(),
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
