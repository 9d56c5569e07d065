//! Claim and payout engine.
//!
//! A claim pays the position's current owner and burns the position in
//! one critical section. The transfer happens before the burn: if the
//! value medium refuses it, the position stays live and can be claimed
//! again once the recipient issue is fixed.

use serde::Serialize;
use tracing::{info, warn};

use super::engine::{EngineState, SettlementEngine};
use crate::domain::payout::compute_payout;
use crate::domain::{AccountId, Amount, PositionId, SettlementError, SettlementRecord};

/// Result of a successful claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimReceipt {
    pub position_id: PositionId,
    /// Owner the payout was sent to.
    pub claimant: AccountId,
    pub payout: Amount,
}

/// Validate a position against its market and compute its payout.
fn winning_payout(
    state: &EngineState,
    position_id: PositionId,
) -> Result<(AccountId, Amount), SettlementError> {
    let position = state.positions.get(position_id)?;
    let market = state.markets.get(position.market_id())?;
    let actual = market
        .winning_outcome()
        .ok_or_else(|| SettlementError::MarketNotResolved {
            market_id: market.id().clone(),
        })?;
    if position.outcome() != actual {
        return Err(SettlementError::NotWinningPosition {
            predicted: position.outcome(),
            actual,
        });
    }

    let pools = market.pools();
    let payout = compute_payout(
        position.net_stake(),
        pools.total(actual),
        pools.total(actual.opposite()),
    )?;
    Ok((position.owner().clone(), payout))
}

impl SettlementEngine {
    /// Pay out a winning position and burn it. Reward distributor only.
    ///
    /// # Errors
    ///
    /// - [`SettlementError::NotRewardDistributor`] for any other caller
    /// - [`SettlementError::TokenDoesNotExist`] for unknown or claimed positions
    /// - [`SettlementError::MarketNotResolved`] before resolution
    /// - [`SettlementError::NotWinningPosition`] for the losing side
    /// - [`SettlementError::RewardTransferFailed`] when the medium refuses;
    ///   the position is left intact
    pub fn claim_reward(
        &self,
        caller: &AccountId,
        position_id: PositionId,
    ) -> Result<ClaimReceipt, SettlementError> {
        let result = {
            let mut state = self.lock();
            self.commit_claim(&mut state, caller, position_id)
        };
        let receipt = result.map_err(|e| {
            warn!(position_id = %position_id, error = %e, "Claim rejected");
            e
        })?;

        info!(
            position_id = %position_id,
            claimant = %receipt.claimant,
            payout = receipt.payout,
            "Reward claimed"
        );
        self.emit([SettlementRecord::RewardClaimed {
            claimant: receipt.claimant.clone(),
            position_id,
            payout: receipt.payout,
        }]);
        Ok(receipt)
    }

    /// Payout a winning position would receive if claimed now.
    ///
    /// # Errors
    ///
    /// The same validation errors as [`SettlementEngine::claim_reward`],
    /// without the caller check.
    pub fn preview_payout(&self, position_id: PositionId) -> Result<Amount, SettlementError> {
        winning_payout(&self.lock(), position_id).map(|(_, payout)| payout)
    }

    fn commit_claim(
        &self,
        state: &mut EngineState,
        caller: &AccountId,
        position_id: PositionId,
    ) -> Result<ClaimReceipt, SettlementError> {
        if caller != &state.config.reward_distributor {
            return Err(SettlementError::NotRewardDistributor {
                caller: caller.clone(),
            });
        }
        let (claimant, payout) = winning_payout(state, position_id)?;
        let escrow = state
            .escrow
            .checked_sub(payout)
            .ok_or(SettlementError::ArithmeticOverflow { operation: "escrow" })?;

        self.transfer_medium()
            .transfer(&claimant, payout)
            .map_err(|e| SettlementError::RewardTransferFailed {
                position_id,
                reason: e.to_string(),
            })?;

        state.positions.burn(position_id)?;
        state.escrow = escrow;
        Ok(ClaimReceipt {
            position_id,
            claimant,
            payout,
        })
    }
}
