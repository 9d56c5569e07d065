//! Settlement errors raised when a domain invariant or precondition fails.
//!
//! Every variant carries the offending value and the limit or expectation
//! it was checked against, so callers can diagnose a rejection without
//! re-deriving engine internals. A returned error always means the
//! operation left no trace in engine state.
//!
//! # Examples
//!
//! ```
//! use settlebook::domain::error::{ErrorCategory, SettlementError};
//!
//! let err = SettlementError::StakeBelowMinimum { stake: 5, minimum: 10 };
//! assert_eq!(err.category(), ErrorCategory::InputValidation);
//! assert!(!err.is_retryable());
//! ```

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::id::{AccountId, MarketId, PositionId};
use super::market::Outcome;
use super::money::{Amount, BasisPoints};

/// Broad classes of settlement failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller-fixable input problems (zero id, zero amount, bad expiration).
    InputValidation,
    /// Wrong caller for a gated operation.
    Authorization,
    /// Market or position is in the wrong lifecycle state.
    StatePrecondition,
    /// External data was unusable (stale or unavailable oracle).
    ExternalData,
    /// The value medium refused a transfer.
    Transfer,
    /// Checked arithmetic overflowed.
    Arithmetic,
}

impl ErrorCategory {
    /// Stable name used in logs and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidation => "input_validation",
            Self::Authorization => "authorization",
            Self::StatePrecondition => "state_precondition",
            Self::ExternalData => "external_data",
            Self::Transfer => "transfer",
            Self::Arithmetic => "arithmetic",
        }
    }
}

/// Errors returned by settlement engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("market id must not be the zero id")]
    InvalidMarketId,

    #[error("market {market_id} already exists")]
    MarketAlreadyExists { market_id: MarketId },

    #[error("expiration {expiration} must be after current time {now}")]
    InvalidExpirationTime {
        expiration: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("market {market_id} does not exist")]
    MarketDoesNotExist { market_id: MarketId },

    #[error("market {market_id} is already resolved")]
    MarketAlreadyResolved { market_id: MarketId },

    #[error("market {market_id} expired at {expiration}")]
    MarketExpired {
        market_id: MarketId,
        expiration: DateTime<Utc>,
    },

    #[error("market {market_id} is not resolved yet")]
    MarketNotResolved { market_id: MarketId },

    #[error("amount cannot be zero")]
    AmountCannotBeZero,

    #[error("stake {stake} is below the market minimum {minimum}")]
    StakeBelowMinimum { stake: Amount, minimum: Amount },

    #[error("zero address is not a valid {field}")]
    ZeroAddressInput { field: &'static str },

    #[error("{user} already holds a prediction on market {market_id}")]
    AlreadyPredicted { user: AccountId, market_id: MarketId },

    #[error("value mismatch: expected {expected} (stake + fee), got {provided}")]
    ValueMismatch { expected: Amount, provided: Amount },

    #[error("minimum stake {provided} is below the global minimum {global_minimum}")]
    InvalidMinStake {
        provided: Amount,
        global_minimum: Amount,
    },

    #[error("fee rate {bps} bps exceeds the maximum of {max} bps")]
    InvalidFeeRate { bps: BasisPoints, max: BasisPoints },

    #[error("price staleness window must be greater than zero")]
    InvalidStalenessWindow,

    #[error("{caller} is not the protocol owner")]
    NotOwner { caller: AccountId },

    #[error("{caller} is not the oracle resolver")]
    NotOracleResolver { caller: AccountId },

    #[error("{caller} is not the reward distributor")]
    NotRewardDistributor { caller: AccountId },

    #[error("{caller} does not own position {position_id}")]
    NotPositionOwner {
        caller: AccountId,
        position_id: PositionId,
    },

    #[error("position {position_id} does not exist")]
    TokenDoesNotExist { position_id: PositionId },

    #[error("position id {position_id} was already issued")]
    PositionIdRetired { position_id: PositionId },

    #[error("position predicted {predicted} but market resolved {actual}")]
    NotWinningPosition { predicted: Outcome, actual: Outcome },

    #[error("oracle price is stale: updated {updated_at}, age {age_secs}s exceeds {max_age_secs}s")]
    PriceOracleStale {
        updated_at: DateTime<Utc>,
        age_secs: i64,
        max_age_secs: u64,
    },

    #[error("oracle unavailable: {reason}")]
    OracleUnavailable { reason: String },

    #[error("reward transfer for {position_id} failed: {reason}")]
    RewardTransferFailed {
        position_id: PositionId,
        reason: String,
    },

    #[error("fee withdrawal failed: {reason}")]
    FeeWithdrawalFailed { reason: String },

    #[error("requested {requested} exceeds accrued fees {available}")]
    InsufficientFees { requested: Amount, available: Amount },

    #[error("arithmetic overflow in {operation}")]
    ArithmeticOverflow { operation: &'static str },
}

impl SettlementError {
    /// Classify the error for retry and reporting decisions.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidMarketId
            | Self::InvalidExpirationTime { .. }
            | Self::AmountCannotBeZero
            | Self::StakeBelowMinimum { .. }
            | Self::ZeroAddressInput { .. }
            | Self::ValueMismatch { .. }
            | Self::InvalidMinStake { .. }
            | Self::InvalidFeeRate { .. }
            | Self::InvalidStalenessWindow
            | Self::InsufficientFees { .. } => ErrorCategory::InputValidation,
            Self::NotOwner { .. }
            | Self::NotOracleResolver { .. }
            | Self::NotRewardDistributor { .. }
            | Self::NotPositionOwner { .. } => ErrorCategory::Authorization,
            Self::MarketAlreadyExists { .. }
            | Self::MarketDoesNotExist { .. }
            | Self::MarketAlreadyResolved { .. }
            | Self::MarketExpired { .. }
            | Self::MarketNotResolved { .. }
            | Self::AlreadyPredicted { .. }
            | Self::TokenDoesNotExist { .. }
            | Self::PositionIdRetired { .. }
            | Self::NotWinningPosition { .. } => ErrorCategory::StatePrecondition,
            Self::PriceOracleStale { .. } | Self::OracleUnavailable { .. } => {
                ErrorCategory::ExternalData
            }
            Self::RewardTransferFailed { .. } | Self::FeeWithdrawalFailed { .. } => {
                ErrorCategory::Transfer
            }
            Self::ArithmeticOverflow { .. } => ErrorCategory::Arithmetic,
        }
    }

    /// True when retrying later without changing intent can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::ExternalData | ErrorCategory::Transfer
        )
    }
}
