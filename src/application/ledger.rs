//! Stake ledger: recording predictions and minting positions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::engine::{EngineState, SettlementEngine};
use crate::domain::policy::{compute_fee, minimum_for};
use crate::domain::{
    AccountId, Amount, MarketId, Outcome, PositionId, SettlementError, SettlementRecord,
};

/// Result of a recorded prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StakeReceipt {
    /// The minted position.
    pub position_id: PositionId,
    /// Stake added to the chosen pool.
    pub net_stake: Amount,
    /// Fee credited to the fee ledger.
    pub fee: Amount,
}

/// A prediction request as received from the caller.
struct Prediction<'a> {
    user: &'a AccountId,
    market_id: &'a MarketId,
    outcome: Outcome,
    declared_stake: Amount,
    value: Amount,
}

impl SettlementEngine {
    /// Record `user`'s stake on `outcome` and mint their position.
    ///
    /// `value` is the total the caller supplied and must equal
    /// `declared_stake + fee` exactly; nothing is refunded or short-taken.
    ///
    /// # Errors
    ///
    /// Checked in this order: market missing, resolved, or expired; zero
    /// stake; stake below the market minimum; zero user; user already
    /// predicted on this market; value mismatch. Arithmetic overflow is
    /// reported before any state changes.
    pub fn record_prediction(
        &self,
        user: &AccountId,
        market_id: &MarketId,
        outcome: Outcome,
        declared_stake: Amount,
        value: Amount,
    ) -> Result<StakeReceipt, SettlementError> {
        let now = self.now();
        let request = Prediction {
            user,
            market_id,
            outcome,
            declared_stake,
            value,
        };
        let result = commit_prediction(&mut self.lock(), &request, now);
        let receipt = result.map_err(|e| {
            warn!(user = %user, market_id = %market_id, error = %e, "Prediction rejected");
            e
        })?;

        info!(
            user = %user,
            market_id = %market_id,
            outcome = %outcome,
            position_id = %receipt.position_id,
            net_stake = receipt.net_stake,
            fee = receipt.fee,
            "Prediction recorded"
        );
        self.emit([SettlementRecord::StakeRecorded {
            market_id: market_id.clone(),
            position_id: receipt.position_id,
            user: user.clone(),
            outcome,
            net_stake: receipt.net_stake,
            fee: receipt.fee,
        }]);
        Ok(receipt)
    }
}

fn commit_prediction(
    state: &mut EngineState,
    request: &Prediction<'_>,
    now: DateTime<Utc>,
) -> Result<StakeReceipt, SettlementError> {
    let market_id = request.market_id;
    let declared_stake = request.declared_stake;

    let market = state.markets.get(market_id)?;
    if market.is_resolved() {
        return Err(SettlementError::MarketAlreadyResolved {
            market_id: market_id.clone(),
        });
    }
    if market.is_past_expiration(now) {
        return Err(SettlementError::MarketExpired {
            market_id: market_id.clone(),
            expiration: market.expiration(),
        });
    }
    if declared_stake == 0 {
        return Err(SettlementError::AmountCannotBeZero);
    }
    let minimum = minimum_for(market, state.config.default_market_min_stake);
    if declared_stake < minimum {
        return Err(SettlementError::StakeBelowMinimum {
            stake: declared_stake,
            minimum,
        });
    }
    if request.user.is_zero() {
        return Err(SettlementError::ZeroAddressInput { field: "user" });
    }
    if state.positions.has_predicted(request.user, market_id) {
        return Err(SettlementError::AlreadyPredicted {
            user: request.user.clone(),
            market_id: market_id.clone(),
        });
    }
    let fee = compute_fee(declared_stake, state.config.fee_bps)?;
    let expected = declared_stake
        .checked_add(fee)
        .ok_or(SettlementError::ArithmeticOverflow {
            operation: "stake plus fee",
        })?;
    if request.value != expected {
        return Err(SettlementError::ValueMismatch {
            expected,
            provided: request.value,
        });
    }

    // Stage every fallible update; the mint is the last thing that can fail.
    let fees = state.fees.credited(fee)?;
    let escrow = state
        .escrow
        .checked_add(declared_stake)
        .ok_or(SettlementError::ArithmeticOverflow { operation: "escrow" })?;
    let mut updated = market.clone();
    updated.add_stake(request.outcome, declared_stake)?;

    let position_id = state.positions.mint(
        request.user.clone(),
        market_id.clone(),
        request.outcome,
        declared_stake,
        now,
    )?;
    *state.markets.get_mut(market_id)? = updated;
    state.fees = fees;
    state.escrow = escrow;

    Ok(StakeReceipt {
        position_id,
        net_stake: declared_stake,
        fee,
    })
}
