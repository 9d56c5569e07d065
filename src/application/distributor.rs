//! Reward distributor: the entry point position holders claim through.
//!
//! The engine only accepts claims from the configured distributor
//! identity. The distributor in turn only forwards claims from the
//! position's current owner.

use std::sync::Arc;

use tracing::warn;

use super::claim::ClaimReceipt;
use super::engine::SettlementEngine;
use crate::domain::{AccountId, PositionId, SettlementError};

/// Pass-through that checks position ownership before claiming.
pub struct RewardDistributor {
    engine: Arc<SettlementEngine>,
    identity: AccountId,
}

impl RewardDistributor {
    /// Create a distributor acting as `identity`.
    #[must_use]
    pub const fn new(engine: Arc<SettlementEngine>, identity: AccountId) -> Self {
        Self { engine, identity }
    }

    /// The identity this distributor claims as.
    #[must_use]
    pub const fn identity(&self) -> &AccountId {
        &self.identity
    }

    /// Claim `position_id` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NotPositionOwner`] when `caller` does not own the
    /// position, otherwise any error of [`SettlementEngine::claim_reward`].
    pub fn claim(
        &self,
        caller: &AccountId,
        position_id: PositionId,
    ) -> Result<ClaimReceipt, SettlementError> {
        let position = self.engine.position(position_id)?;
        if position.owner() != caller {
            warn!(caller = %caller, position_id = %position_id, "Claim by non-owner");
            return Err(SettlementError::NotPositionOwner {
                caller: caller.clone(),
                position_id,
            });
        }
        self.engine.claim_reward(&self.identity, position_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Outcome;
    use crate::testkit::fixtures::{alice, bob, carol, eth_usd, price, units};
    use crate::testkit::Harness;
    use rust_decimal_macros::dec;

    #[test]
    fn pays_current_owner_only() {
        let h = Harness::new();
        let market = h.market("eth", price(dec!(3000)));
        let receipt = h
            .stake(&alice(), &market, Outcome::Above, units(dec!(1)))
            .unwrap();
        h.expire(&market);
        h.publish(&eth_usd(), price(dec!(3500)));
        h.resolve(&market).unwrap();

        h.engine
            .transfer_position(&alice(), receipt.position_id, carol())
            .unwrap();

        let err = h.claim(&alice(), receipt.position_id).unwrap_err();
        assert_eq!(
            err,
            SettlementError::NotPositionOwner {
                caller: alice(),
                position_id: receipt.position_id,
            }
        );
        assert!(h.claim(&bob(), receipt.position_id).is_err());

        let paid = h.claim(&carol(), receipt.position_id).unwrap();
        assert_eq!(paid.claimant, carol());
        assert_eq!(paid.payout, units(dec!(1)));
        assert_eq!(h.ledger.balance_of(&carol()), units(dec!(1)));
    }

    #[test]
    fn unknown_position_is_reported() {
        let h = Harness::new();
        let err = h.claim(&alice(), PositionId::new(42)).unwrap_err();
        assert!(matches!(err, SettlementError::TokenDoesNotExist { .. }));
    }
}
