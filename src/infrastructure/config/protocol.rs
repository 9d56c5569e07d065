//! `[protocol]` section: identities, fees, and stake floors.
//!
//! Stakes are written in human units (`0.01`) and converted to base units
//! with `decimals`. Identities may be overridden from the environment.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::money::{parse_units, MAX_DECIMALS};
use crate::domain::{AccountId, Amount, BasisPoints, ProtocolConfig};
use crate::error::{ConfigError, Result};

/// Environment variable overriding `protocol.owner`.
pub const OWNER_ENV: &str = "SETTLEBOOK_OWNER";

/// Environment variable overriding `protocol.oracle_resolver`.
pub const ORACLE_RESOLVER_ENV: &str = "SETTLEBOOK_ORACLE_RESOLVER";

/// Protocol settings as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProtocolSettings {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub treasury: String,
    #[serde(default)]
    pub oracle_resolver: String,
    #[serde(default)]
    pub reward_distributor: String,
    #[serde(default = "default_fee_bps")]
    pub fee_bps: BasisPoints,
    /// Decimals of the value medium.
    #[serde(default = "default_decimals")]
    pub decimals: u32,
    #[serde(default = "default_min_stake")]
    pub global_min_stake: Decimal,
    #[serde(default = "default_min_stake")]
    pub default_market_min_stake: Decimal,
    #[serde(default = "default_staleness")]
    pub max_price_staleness_secs: u64,
}

fn default_fee_bps() -> BasisPoints {
    100
}

fn default_decimals() -> u32 {
    18
}

fn default_min_stake() -> Decimal {
    dec!(0.001)
}

fn default_staleness() -> u64 {
    3600
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            owner: String::new(),
            treasury: String::new(),
            oracle_resolver: String::new(),
            reward_distributor: String::new(),
            fee_bps: default_fee_bps(),
            decimals: default_decimals(),
            global_min_stake: default_min_stake(),
            default_market_min_stake: default_min_stake(),
            max_price_staleness_secs: default_staleness(),
        }
    }
}

fn identity(field: &'static str, raw: &str) -> Result<AccountId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::MissingField { field }.into());
    }
    let id = AccountId::new(raw);
    if id.is_zero() {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must not be the zero identity".to_string(),
        }
        .into());
    }
    Ok(id)
}

impl ProtocolSettings {
    /// Apply `SETTLEBOOK_*` identity overrides from the environment.
    pub fn apply_env(&mut self) {
        if let Ok(owner) = std::env::var(OWNER_ENV) {
            self.owner = owner;
        }
        if let Ok(resolver) = std::env::var(ORACLE_RESOLVER_ENV) {
            self.oracle_resolver = resolver;
        }
    }

    /// Convert a human-unit stake to base units.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for negative, overly precise,
    /// or overflowing values.
    pub fn units(&self, field: &'static str, value: Decimal) -> Result<Amount> {
        parse_units(value, self.decimals).ok_or_else(|| {
            ConfigError::InvalidValue {
                field,
                reason: format!("{value} is not representable with {} decimals", self.decimals),
            }
            .into()
        })
    }

    /// Build and validate the engine configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending field.
    pub fn to_protocol_config(&self) -> Result<ProtocolConfig> {
        if self.decimals > MAX_DECIMALS {
            return Err(ConfigError::InvalidValue {
                field: "decimals",
                reason: format!("must be at most {MAX_DECIMALS}"),
            }
            .into());
        }
        let config = ProtocolConfig {
            owner: identity("owner", &self.owner)?,
            treasury: identity("treasury", &self.treasury)?,
            oracle_resolver: identity("oracle_resolver", &self.oracle_resolver)?,
            reward_distributor: identity("reward_distributor", &self.reward_distributor)?,
            fee_bps: self.fee_bps,
            global_min_stake: self.units("global_min_stake", self.global_min_stake)?,
            default_market_min_stake: self
                .units("default_market_min_stake", self.default_market_min_stake)?,
            max_price_staleness_secs: self.max_price_staleness_secs,
        };
        config.validate().map_err(|e| ConfigError::InvalidValue {
            field: "protocol",
            reason: e.to_string(),
        })?;
        Ok(config)
    }
}
