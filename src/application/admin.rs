//! Owner path: configuration changes, fee withdrawal, and position transfer.

use tracing::{info, warn};

use super::engine::{EngineState, SettlementEngine};
use crate::domain::policy::{validate_fee_bps, validate_min_stake};
use crate::domain::{
    AccountId, Amount, BasisPoints, MarketId, PositionId, SettlementError, SettlementRecord,
};

type Changes = Vec<(String, String)>;

fn change(field: impl Into<String>, value: impl ToString) -> (String, String) {
    (field.into(), value.to_string())
}

fn ensure_identity(field: &'static str, id: &AccountId) -> Result<(), SettlementError> {
    if id.is_zero() {
        return Err(SettlementError::ZeroAddressInput { field });
    }
    Ok(())
}

impl SettlementEngine {
    /// Run an owner-gated mutation and publish one `ConfigUpdated` per change.
    fn owner_update<F>(&self, caller: &AccountId, apply: F) -> Result<(), SettlementError>
    where
        F: FnOnce(&mut EngineState) -> Result<Changes, SettlementError>,
    {
        let changes = {
            let mut state = self.lock();
            if caller != &state.config.owner {
                warn!(caller = %caller, "Configuration change by non-owner");
                return Err(SettlementError::NotOwner {
                    caller: caller.clone(),
                });
            }
            apply(&mut state)?
        };

        for (field, value) in &changes {
            info!(field = %field, value = %value, "Configuration updated");
        }
        self.emit(
            changes
                .into_iter()
                .map(|(field, value)| SettlementRecord::ConfigUpdated { field, value }),
        );
        Ok(())
    }

    /// Set the protocol fee rate.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NotOwner`] or [`SettlementError::InvalidFeeRate`].
    pub fn set_fee_bps(&self, caller: &AccountId, bps: BasisPoints) -> Result<(), SettlementError> {
        self.owner_update(caller, |state| {
            validate_fee_bps(bps)?;
            state.config.fee_bps = bps;
            Ok(vec![change("fee_bps", bps)])
        })
    }

    /// Set the global minimum stake.
    ///
    /// Raising it above the default market minimum raises the default too.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NotOwner`] or [`SettlementError::AmountCannotBeZero`].
    pub fn set_global_min_stake(
        &self,
        caller: &AccountId,
        amount: Amount,
    ) -> Result<(), SettlementError> {
        self.owner_update(caller, |state| {
            if amount == 0 {
                return Err(SettlementError::AmountCannotBeZero);
            }
            let mut changes = vec![change("global_min_stake", amount)];
            state.config.global_min_stake = amount;
            if state.config.default_market_min_stake < amount {
                state.config.default_market_min_stake = amount;
                changes.push(change("default_market_min_stake", amount));
            }
            Ok(changes)
        })
    }

    /// Set the minimum stake assigned to markets created from now on.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NotOwner`] or [`SettlementError::InvalidMinStake`].
    pub fn set_default_market_min_stake(
        &self,
        caller: &AccountId,
        amount: Amount,
    ) -> Result<(), SettlementError> {
        self.owner_update(caller, |state| {
            validate_min_stake(amount, state.config.global_min_stake)?;
            state.config.default_market_min_stake = amount;
            Ok(vec![change("default_market_min_stake", amount)])
        })
    }

    /// Override the minimum stake of one unresolved market.
    ///
    /// # Errors
    ///
    /// - [`SettlementError::NotOwner`]
    /// - [`SettlementError::InvalidMinStake`] below the global minimum
    /// - [`SettlementError::MarketDoesNotExist`]
    /// - [`SettlementError::MarketAlreadyResolved`]
    pub fn set_market_min_stake(
        &self,
        caller: &AccountId,
        market_id: &MarketId,
        amount: Amount,
    ) -> Result<(), SettlementError> {
        self.owner_update(caller, |state| {
            validate_min_stake(amount, state.config.global_min_stake)?;
            state.markets.get_mut(market_id)?.set_min_stake(amount)?;
            Ok(vec![change(format!("market_min_stake.{market_id}"), amount)])
        })
    }

    /// Set the maximum accepted oracle price age.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NotOwner`] or [`SettlementError::InvalidStalenessWindow`].
    pub fn set_max_price_staleness(
        &self,
        caller: &AccountId,
        secs: u64,
    ) -> Result<(), SettlementError> {
        self.owner_update(caller, |state| {
            if secs == 0 {
                return Err(SettlementError::InvalidStalenessWindow);
            }
            state.config.max_price_staleness_secs = secs;
            Ok(vec![change("max_price_staleness_secs", secs)])
        })
    }

    /// Replace the oracle resolver identity.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NotOwner`] or [`SettlementError::ZeroAddressInput`].
    pub fn set_oracle_resolver(
        &self,
        caller: &AccountId,
        resolver: AccountId,
    ) -> Result<(), SettlementError> {
        self.owner_update(caller, |state| {
            ensure_identity("oracle resolver", &resolver)?;
            let value = change("oracle_resolver", &resolver);
            state.config.oracle_resolver = resolver;
            Ok(vec![value])
        })
    }

    /// Replace the reward distributor identity.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NotOwner`] or [`SettlementError::ZeroAddressInput`].
    pub fn set_reward_distributor(
        &self,
        caller: &AccountId,
        distributor: AccountId,
    ) -> Result<(), SettlementError> {
        self.owner_update(caller, |state| {
            ensure_identity("reward distributor", &distributor)?;
            let value = change("reward_distributor", &distributor);
            state.config.reward_distributor = distributor;
            Ok(vec![value])
        })
    }

    /// Replace the fee treasury.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NotOwner`] or [`SettlementError::ZeroAddressInput`].
    pub fn set_treasury(
        &self,
        caller: &AccountId,
        treasury: AccountId,
    ) -> Result<(), SettlementError> {
        self.owner_update(caller, |state| {
            ensure_identity("treasury", &treasury)?;
            let value = change("treasury", &treasury);
            state.config.treasury = treasury;
            Ok(vec![value])
        })
    }

    /// Hand the owner role to `new_owner`.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NotOwner`] or [`SettlementError::ZeroAddressInput`].
    pub fn transfer_ownership(
        &self,
        caller: &AccountId,
        new_owner: AccountId,
    ) -> Result<(), SettlementError> {
        self.owner_update(caller, |state| {
            ensure_identity("owner", &new_owner)?;
            let value = change("owner", &new_owner);
            state.config.owner = new_owner;
            Ok(vec![value])
        })
    }

    /// Send accumulated fees to the treasury. Owner only.
    ///
    /// # Errors
    ///
    /// - [`SettlementError::NotOwner`]
    /// - [`SettlementError::AmountCannotBeZero`]
    /// - [`SettlementError::InsufficientFees`] above the fee balance
    /// - [`SettlementError::FeeWithdrawalFailed`] when the medium refuses;
    ///   the ledger is left unchanged
    pub fn withdraw_fees(&self, caller: &AccountId, amount: Amount) -> Result<(), SettlementError> {
        let treasury = {
            let mut state = self.lock();
            if caller != &state.config.owner {
                return Err(SettlementError::NotOwner {
                    caller: caller.clone(),
                });
            }
            if amount == 0 {
                return Err(SettlementError::AmountCannotBeZero);
            }
            let fees = state.fees.debited(amount)?;
            let treasury = state.config.treasury.clone();
            self.transfer_medium()
                .transfer(&treasury, amount)
                .map_err(|e| {
                    warn!(treasury = %treasury, amount, error = %e, "Fee withdrawal failed");
                    SettlementError::FeeWithdrawalFailed {
                        reason: e.to_string(),
                    }
                })?;
            state.fees = fees;
            treasury
        };

        info!(treasury = %treasury, amount, "Fees withdrawn");
        self.emit([SettlementRecord::FeesWithdrawn { treasury, amount }]);
        Ok(())
    }

    /// Move a live position to a new owner.
    ///
    /// The staker index is not rewritten: the original staker still cannot
    /// predict again on the same market.
    ///
    /// # Errors
    ///
    /// - [`SettlementError::TokenDoesNotExist`]
    /// - [`SettlementError::NotPositionOwner`] unless `caller` owns it
    /// - [`SettlementError::ZeroAddressInput`] for the zero recipient
    pub fn transfer_position(
        &self,
        caller: &AccountId,
        position_id: PositionId,
        to: AccountId,
    ) -> Result<(), SettlementError> {
        self.lock()
            .positions
            .transfer(position_id, caller, to.clone())?;

        info!(position_id = %position_id, from = %caller, to = %to, "Position transferred");
        self.emit([SettlementRecord::PositionTransferred {
            position_id,
            from: caller.clone(),
            to,
        }]);
        Ok(())
    }
}
