//! Market registry operations.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::engine::SettlementEngine;
use crate::domain::{
    AccountId, FeedId, Market, MarketId, Price, SettlementError, SettlementRecord,
};

impl SettlementEngine {
    /// Register a new market. Owner only.
    ///
    /// The market starts unresolved with empty pools and its minimum stake
    /// fixed at the current default.
    ///
    /// # Errors
    ///
    /// - [`SettlementError::NotOwner`] for any other caller
    /// - [`SettlementError::InvalidMarketId`] for the zero id
    /// - [`SettlementError::MarketAlreadyExists`] for a duplicate id
    /// - [`SettlementError::InvalidExpirationTime`] when expiration is not in the future
    pub fn create_market(
        &self,
        caller: &AccountId,
        market_id: MarketId,
        expiration: DateTime<Utc>,
        price_feed: FeedId,
        price_threshold: Price,
    ) -> Result<Market, SettlementError> {
        let now = self.now();
        let market = {
            let mut state = self.lock();
            if caller != &state.config.owner {
                return Err(SettlementError::NotOwner {
                    caller: caller.clone(),
                });
            }
            let min_stake = state.config.default_market_min_stake;
            state
                .markets
                .create(
                    market_id,
                    expiration,
                    price_feed,
                    price_threshold,
                    min_stake,
                    now,
                )
                .map_err(|e| {
                    warn!(error = %e, "Market creation rejected");
                    e
                })?
                .clone()
        };

        info!(
            market_id = %market.id(),
            feed = %market.price_feed(),
            threshold = market.price_threshold(),
            expiration = %market.expiration(),
            "Market created"
        );
        self.emit([SettlementRecord::MarketCreated {
            market_id: market.id().clone(),
            price_feed: market.price_feed().clone(),
            price_threshold: market.price_threshold(),
            expiration: market.expiration(),
        }]);
        Ok(market)
    }

    /// Snapshot of a registered market.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::MarketDoesNotExist`] for unknown ids.
    pub fn market_details(&self, market_id: &MarketId) -> Result<Market, SettlementError> {
        debug!(market_id = %market_id, "Reading market");
        self.lock().markets.get(market_id).cloned()
    }

    /// True when the market is at or past its expiration.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::MarketDoesNotExist`] for unknown ids.
    pub fn is_past_expiration(&self, market_id: &MarketId) -> Result<bool, SettlementError> {
        let now = self.now();
        Ok(self.lock().markets.get(market_id)?.is_past_expiration(now))
    }

    /// Markets still accepting stakes.
    #[must_use]
    pub fn open_markets(&self) -> Vec<Market> {
        let now = self.now();
        self.lock()
            .markets
            .unresolved()
            .filter(|m| !m.is_past_expiration(now))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::fixtures::{alice, eth_usd, owner, price};
    use crate::testkit::Harness;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn only_owner_creates_markets() {
        let h = Harness::new();
        let err = h
            .engine
            .create_market(
                &alice(),
                MarketId::new("eth"),
                h.engine.now() + Duration::hours(1),
                eth_usd(),
                price(dec!(3000)),
            )
            .unwrap_err();
        assert!(matches!(err, SettlementError::NotOwner { .. }));
        assert!(h.engine.markets().is_empty());
        assert!(h.records.records().is_empty());
    }

    #[test]
    fn new_market_takes_default_min_stake() {
        let h = Harness::new();
        let market = h.market("eth", price(dec!(3000)));
        let details = h.engine.market_details(&market).unwrap();
        assert_eq!(
            details.min_stake(),
            Some(h.engine.config().default_market_min_stake)
        );
        assert!(!details.is_resolved());
        assert_eq!(h.records.count("market_created"), 1);
    }

    #[test]
    fn expiration_must_be_in_the_future() {
        let h = Harness::new();
        let err = h
            .engine
            .create_market(
                &owner(),
                MarketId::new("eth"),
                h.engine.now(),
                eth_usd(),
                price(dec!(3000)),
            )
            .unwrap_err();
        assert!(matches!(err, SettlementError::InvalidExpirationTime { .. }));
    }

    #[test]
    fn expired_markets_leave_the_open_list() {
        let h = Harness::new();
        let market = h.market("eth", price(dec!(3000)));
        assert_eq!(h.engine.open_markets().len(), 1);
        assert!(!h.engine.is_past_expiration(&market).unwrap());

        h.expire(&market);
        assert!(h.engine.is_past_expiration(&market).unwrap());
        assert!(h.engine.open_markets().is_empty());
        assert!(h.engine.is_past_expiration(&MarketId::new("nope")).is_err());
    }
}
