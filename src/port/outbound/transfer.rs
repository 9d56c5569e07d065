//! Value-transfer port for payouts and fee withdrawals.

use thiserror::Error;

use crate::domain::{AccountId, Amount};

/// Reasons the value medium can refuse a transfer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("recipient {recipient} rejected the transfer: {reason}")]
    Rejected { recipient: AccountId, reason: String },

    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    #[error("transfer medium unavailable: {0}")]
    Unavailable(String),
}

/// Moves value out of engine custody.
///
/// A failed transfer must leave balances untouched; the engine relies on
/// this to keep the position or fee balance intact for a retry.
pub trait ValueTransfer: Send + Sync {
    /// Credit `amount` to `to`.
    fn transfer(&self, to: &AccountId, amount: Amount) -> Result<(), TransferError>;
}
