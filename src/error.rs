use thiserror::Error;

use crate::domain::error::SettlementError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Scenario replay errors.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse scenario: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("step {step}: {reason}")]
    InvalidStep { step: usize, reason: String },

    #[error("step {step} failed: {source}")]
    StepFailed {
        step: usize,
        #[source]
        source: SettlementError,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
