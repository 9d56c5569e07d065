//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; privileged identities can be
//! overridden with `SETTLEBOOK_OWNER` and `SETTLEBOOK_ORACLE_RESOLVER`.
//!
//! # Example
//!
//! ```no_run
//! use settlebook::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.logging.init();
//!     let protocol = config.protocol_config()?;
//!     println!("fee: {} bps", protocol.fee_bps);
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::keeper::KeeperConfig;
use super::logging::LoggingConfig;
use super::protocol::ProtocolSettings;
use crate::domain::ProtocolConfig;
use crate::error::{ConfigError, Result};

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Protocol identities, fee rate, and stake floors.
    #[serde(default)]
    pub protocol: ProtocolSettings,

    /// Automation keeper scheduling.
    #[serde(default)]
    pub keeper: KeeperConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.protocol.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if !self.logging.is_known_format() {
            return Err(ConfigError::InvalidValue {
                field: "format",
                reason: "must be \"pretty\" or \"json\"".to_string(),
            }
            .into());
        }
        if self.keeper.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.keeper.max_batch == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_batch",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        self.protocol.to_protocol_config()?;
        Ok(())
    }

    /// Engine configuration derived from `[protocol]`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the protocol section is invalid.
    pub fn protocol_config(&self) -> Result<ProtocolConfig> {
        self.protocol.to_protocol_config()
    }
}
