//! Scenario file format for `replay`.
//!
//! A scenario is a TOML document with an optional `[protocol]` table (the
//! same shape as in `config.toml`) and an ordered list of `[[step]]`
//! tables, each tagged by `action`:
//!
//! ```toml
//! start = "2025-01-01T00:00:00Z"
//! price_decimals = 8
//!
//! [[step]]
//! action = "create_market"
//! market = "eth-3000"
//! feed = "ETH/USD"
//! threshold = 3000
//! expires_in_secs = 3600
//!
//! [[step]]
//! action = "predict"
//! user = "0xa"
//! market = "eth-3000"
//! outcome = "above"
//! stake = 1.0
//! ```
//!
//! Stakes and fee amounts are in human units of the value medium
//! (`protocol.decimals`); prices use `price_decimals`.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{BasisPoints, Outcome};
use crate::error::{Result, ScenarioError};
use crate::infrastructure::config::protocol::ProtocolSettings;

/// A parsed scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Initial clock time (RFC 3339 string).
    #[serde(default = "default_start")]
    pub start: DateTime<Utc>,
    /// Decimals of oracle prices and thresholds.
    #[serde(default = "default_price_decimals")]
    pub price_decimals: u32,
    /// Protocol settings used when no `--config` is given.
    #[serde(default)]
    pub protocol: Option<ProtocolSettings>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

fn default_start() -> DateTime<Utc> {
    Utc.timestamp_opt(1_735_689_600, 0)
        .single()
        .unwrap_or_default()
}

fn default_price_decimals() -> u32 {
    8
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Owner registers a market expiring `expires_in_secs` from now.
    CreateMarket {
        market: String,
        feed: String,
        threshold: Decimal,
        expires_in_secs: i64,
    },
    /// A user stakes. `value` defaults to the stake plus the current fee.
    Predict {
        user: String,
        market: String,
        outcome: Outcome,
        stake: Decimal,
        #[serde(default)]
        value: Option<Decimal>,
    },
    /// Publish a price, `age_secs` old.
    SetPrice {
        feed: String,
        price: Decimal,
        #[serde(default)]
        age_secs: i64,
    },
    /// Make the feed unreadable.
    OracleOutage { feed: String },
    /// Undo [`Step::OracleOutage`].
    OracleRestore { feed: String },
    /// Move the clock forward.
    Advance { secs: i64 },
    /// Run one keeper pass.
    KeeperTick,
    /// Resolver resolves from the oracle.
    Resolve { market: String },
    /// Resolver resolves with an explicit outcome.
    ResolveManual {
        market: String,
        outcome: Outcome,
        price: Decimal,
    },
    /// Owner of a position claims through the reward distributor.
    Claim { user: String, position: u64 },
    /// The value medium refuses transfers to `account`.
    RejectTransfers { account: String },
    /// Undo [`Step::RejectTransfers`].
    AcceptTransfers { account: String },
    /// Move a position to a new owner.
    TransferPosition {
        from: String,
        position: u64,
        to: String,
    },
    /// Owner withdraws fees to the treasury.
    WithdrawFees { amount: Decimal },
    /// Owner changes the fee rate.
    SetFeeBps { bps: BasisPoints },
}

impl Step {
    /// The `action` tag of this step.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::CreateMarket { .. } => "create_market",
            Self::Predict { .. } => "predict",
            Self::SetPrice { .. } => "set_price",
            Self::OracleOutage { .. } => "oracle_outage",
            Self::OracleRestore { .. } => "oracle_restore",
            Self::Advance { .. } => "advance",
            Self::KeeperTick => "keeper_tick",
            Self::Resolve { .. } => "resolve",
            Self::ResolveManual { .. } => "resolve_manual",
            Self::Claim { .. } => "claim",
            Self::RejectTransfers { .. } => "reject_transfers",
            Self::AcceptTransfers { .. } => "accept_transfers",
            Self::TransferPosition { .. } => "transfer_position",
            Self::WithdrawFees { .. } => "withdraw_fees",
            Self::SetFeeBps { .. } => "set_fee_bps",
        }
    }
}

impl Scenario {
    /// Parse a scenario from TOML content.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Parse`] for malformed content.
    pub fn parse_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content).map_err(ScenarioError::Parse)?)
    }

    /// Load a scenario file.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::ReadFile`] or [`ScenarioError::Parse`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ScenarioError::ReadFile)?;
        Self::parse_toml(&content)
    }
}
