//! Protocol-wide configuration and the fee ledger.

use serde::{Deserialize, Serialize};

use super::error::SettlementError;
use super::id::AccountId;
use super::money::{Amount, BasisPoints};
use super::policy::{validate_fee_bps, validate_min_stake};

/// Global settlement parameters and privileged identities.
///
/// Held by the engine instance and changed only through the owner path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Identity allowed to create markets and change configuration.
    pub owner: AccountId,
    /// Receiver of withdrawn fees.
    pub treasury: AccountId,
    /// Identity allowed to resolve markets.
    pub oracle_resolver: AccountId,
    /// Identity allowed to dispatch reward claims.
    pub reward_distributor: AccountId,
    /// Protocol fee, in basis points of the declared stake.
    pub fee_bps: BasisPoints,
    /// Floor for every minimum stake.
    pub global_min_stake: Amount,
    /// Minimum stake assigned to newly created markets.
    pub default_market_min_stake: Amount,
    /// Maximum accepted age of an oracle price at resolution.
    pub max_price_staleness_secs: u64,
}

impl ProtocolConfig {
    /// Check cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), SettlementError> {
        for (field, id) in [
            ("owner", &self.owner),
            ("treasury", &self.treasury),
            ("oracle resolver", &self.oracle_resolver),
            ("reward distributor", &self.reward_distributor),
        ] {
            if id.is_zero() {
                return Err(SettlementError::ZeroAddressInput { field });
            }
        }
        validate_fee_bps(self.fee_bps)?;
        if self.global_min_stake == 0 {
            return Err(SettlementError::AmountCannotBeZero);
        }
        validate_min_stake(self.default_market_min_stake, self.global_min_stake)?;
        if self.max_price_staleness_secs == 0 {
            return Err(SettlementError::InvalidStalenessWindow);
        }
        Ok(())
    }
}

/// Running balance of protocol fees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeeLedger {
    balance: Amount,
    lifetime: Amount,
}

impl FeeLedger {
    /// Fees currently withdrawable.
    #[must_use]
    pub const fn balance(&self) -> Amount {
        self.balance
    }

    /// Fees accrued since the engine started, withdrawals included.
    #[must_use]
    pub const fn lifetime(&self) -> Amount {
        self.lifetime
    }

    /// Preview a credit without applying it.
    ///
    /// # Errors
    ///
    /// Returns an overflow error if either counter would overflow.
    pub fn credited(&self, fee: Amount) -> Result<Self, SettlementError> {
        let overflow = SettlementError::ArithmeticOverflow {
            operation: "fee ledger",
        };
        Ok(Self {
            balance: self.balance.checked_add(fee).ok_or_else(|| overflow.clone())?,
            lifetime: self.lifetime.checked_add(fee).ok_or(overflow)?,
        })
    }

    /// Preview a debit without applying it.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::InsufficientFees`] when the balance is short.
    pub fn debited(&self, amount: Amount) -> Result<Self, SettlementError> {
        let balance = self
            .balance
            .checked_sub(amount)
            .ok_or(SettlementError::InsufficientFees {
                requested: amount,
                available: self.balance,
            })?;
        Ok(Self {
            balance,
            lifetime: self.lifetime,
        })
    }
}
