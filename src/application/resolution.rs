//! Oracle resolution controller.
//!
//! Resolution is a one-way transition guarded by the market's resolved
//! flag. The oracle-driven variant reads the feed outside the engine lock
//! and re-validates on commit, so a concurrent resolution simply makes it
//! fail with `MarketAlreadyResolved`.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::engine::{EngineState, SettlementEngine};
use crate::domain::{
    AccountId, FeedId, MarketId, Outcome, Price, Resolution, SettlementError, SettlementRecord,
};
use crate::port::PriceReading;

fn ensure_resolver(state: &EngineState, caller: &AccountId) -> Result<(), SettlementError> {
    if caller != &state.config.oracle_resolver {
        return Err(SettlementError::NotOracleResolver {
            caller: caller.clone(),
        });
    }
    Ok(())
}

fn ensure_unresolved(state: &EngineState, market_id: &MarketId) -> Result<(), SettlementError> {
    if state.markets.get(market_id)?.is_resolved() {
        return Err(SettlementError::MarketAlreadyResolved {
            market_id: market_id.clone(),
        });
    }
    Ok(())
}

fn feed_for_resolution(
    state: &EngineState,
    caller: &AccountId,
    market_id: &MarketId,
) -> Result<FeedId, SettlementError> {
    ensure_resolver(state, caller)?;
    ensure_unresolved(state, market_id)?;
    Ok(state.markets.get(market_id)?.price_feed().clone())
}

/// Reject a reading older than the staleness window.
///
/// A reading stamped in the future counts as fresh.
pub(crate) fn check_freshness(
    reading: &PriceReading,
    now: DateTime<Utc>,
    max_age_secs: u64,
) -> Result<(), SettlementError> {
    let age_secs = (now - reading.updated_at).num_seconds();
    if age_secs > 0 && age_secs.unsigned_abs() > max_age_secs {
        return Err(SettlementError::PriceOracleStale {
            updated_at: reading.updated_at,
            age_secs,
            max_age_secs,
        });
    }
    Ok(())
}

impl SettlementEngine {
    /// Resolve a market with an explicit outcome. Oracle resolver only.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NotOracleResolver`], [`SettlementError::MarketDoesNotExist`],
    /// or [`SettlementError::MarketAlreadyResolved`].
    pub fn resolve_market(
        &self,
        caller: &AccountId,
        market_id: &MarketId,
        outcome: Outcome,
        observed_price: Price,
    ) -> Result<Resolution, SettlementError> {
        let now = self.now();
        let result = {
            let mut state = self.lock();
            ensure_resolver(&state, caller).and_then(|()| {
                commit_resolution(&mut state, market_id, outcome, observed_price, now)
            })
        };
        self.finish_resolution(market_id, result)
    }

    /// Resolve a market from the oracle's latest price. Oracle resolver only.
    ///
    /// The outcome is [`Outcome::Above`] when the price is strictly above the
    /// threshold and [`Outcome::AtOrBelow`] otherwise, ties included.
    ///
    /// # Errors
    ///
    /// The guards of [`SettlementEngine::resolve_market`], plus
    /// [`SettlementError::OracleUnavailable`] and
    /// [`SettlementError::PriceOracleStale`]. On any error the market is
    /// left exactly as it was and the call can be retried.
    pub fn resolve_from_oracle(
        &self,
        caller: &AccountId,
        market_id: &MarketId,
    ) -> Result<Resolution, SettlementError> {
        let feed = match feed_for_resolution(&self.lock(), caller, market_id) {
            Ok(feed) => feed,
            Err(e) => return self.finish_resolution(market_id, Err(e)),
        };

        let reading = self
            .oracle()
            .latest_price(&feed)
            .map_err(|e| SettlementError::OracleUnavailable {
                reason: e.to_string(),
            });

        let now = self.now();
        let result = reading.and_then(|reading| {
            let mut state = self.lock();
            ensure_unresolved(&state, market_id)?;
            check_freshness(&reading, now, state.config.max_price_staleness_secs)?;
            let threshold = state.markets.get(market_id)?.price_threshold();
            let outcome = Outcome::from_observation(reading.price, threshold);
            commit_resolution(&mut state, market_id, outcome, reading.price, now)
        });
        self.finish_resolution(market_id, result)
    }

    fn finish_resolution(
        &self,
        market_id: &MarketId,
        result: Result<(Resolution, SettlementRecord), SettlementError>,
    ) -> Result<Resolution, SettlementError> {
        match result {
            Ok((resolution, record)) => {
                info!(
                    market_id = %market_id,
                    outcome = %resolution.outcome,
                    price = resolution.observed_price,
                    "Market resolved"
                );
                self.emit([record]);
                Ok(resolution)
            }
            Err(e) => {
                warn!(market_id = %market_id, error = %e, "Resolution rejected");
                Err(e)
            }
        }
    }
}

fn commit_resolution(
    state: &mut EngineState,
    market_id: &MarketId,
    outcome: Outcome,
    observed_price: Price,
    now: DateTime<Utc>,
) -> Result<(Resolution, SettlementRecord), SettlementError> {
    let market = state.markets.get_mut(market_id)?;
    let resolution = market.resolve(outcome, observed_price, now)?;
    let record = SettlementRecord::MarketResolved {
        market_id: market_id.clone(),
        outcome,
        price: observed_price,
        total_pool: market.pools().combined(),
    };
    Ok((resolution, record))
}
