//! The settlement engine: single sequential authority over market state.
//!
//! All mutable state lives in [`EngineState`] behind one mutex. Every
//! operation validates first and commits last inside one critical section,
//! so a returned error always means nothing changed. Records are emitted
//! after the lock is released, in commit order.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::domain::{
    AccountId, Amount, FeeLedger, Market, MarketId, MarketRegistry, Position, PositionBook,
    PositionId, ProtocolConfig, SettlementError, SettlementRecord,
};
use crate::port::{Clock, NullRecordSink, PriceOracle, RecordSink, ValueTransfer};

/// Mutable engine state. Only touched while holding the engine lock.
#[derive(Debug)]
pub(crate) struct EngineState {
    pub(crate) config: ProtocolConfig,
    pub(crate) markets: MarketRegistry,
    pub(crate) positions: PositionBook,
    pub(crate) fees: FeeLedger,
    /// Net stakes held for markets, minus payouts.
    pub(crate) escrow: Amount,
    /// Markets for which `MarketExpired` has been emitted.
    pub(crate) announced_expired: HashSet<MarketId>,
}

/// Pari-mutuel settlement engine.
///
/// Cheap to share behind an `Arc`; the internal lock serializes operations.
pub struct SettlementEngine {
    state: Mutex<EngineState>,
    oracle: Arc<dyn PriceOracle>,
    transfer: Arc<dyn ValueTransfer>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn RecordSink>,
}

/// Builder for [`SettlementEngine`].
pub struct SettlementEngineBuilder {
    config: ProtocolConfig,
    oracle: Arc<dyn PriceOracle>,
    transfer: Arc<dyn ValueTransfer>,
    clock: Option<Arc<dyn Clock>>,
    sink: Option<Arc<dyn RecordSink>>,
}

impl SettlementEngineBuilder {
    /// Use a specific clock. Defaults to the system clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Publish records to `sink`. Defaults to dropping them.
    #[must_use]
    pub fn record_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Validate the configuration and build the engine.
    ///
    /// # Errors
    ///
    /// Returns the first invariant violated by the configuration.
    pub fn build(self) -> Result<SettlementEngine, SettlementError> {
        self.config.validate()?;
        Ok(SettlementEngine {
            state: Mutex::new(EngineState {
                config: self.config,
                markets: MarketRegistry::new(),
                positions: PositionBook::new(),
                fees: FeeLedger::default(),
                escrow: 0,
                announced_expired: HashSet::new(),
            }),
            oracle: self.oracle,
            transfer: self.transfer,
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(crate::adapter::outbound::clock::SystemClock)),
            sink: self.sink.unwrap_or_else(|| Arc::new(NullRecordSink)),
        })
    }
}

impl SettlementEngine {
    /// Start building an engine around its required collaborators.
    #[must_use]
    pub fn builder(
        config: ProtocolConfig,
        oracle: Arc<dyn PriceOracle>,
        transfer: Arc<dyn ValueTransfer>,
    ) -> SettlementEngineBuilder {
        SettlementEngineBuilder {
            config,
            oracle,
            transfer,
            clock: None,
            sink: None,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock()
    }

    pub(crate) fn oracle(&self) -> &dyn PriceOracle {
        self.oracle.as_ref()
    }

    pub(crate) fn transfer_medium(&self) -> &dyn ValueTransfer {
        self.transfer.as_ref()
    }

    /// Publish committed records. Must be called without the lock held.
    pub(crate) fn emit(&self, records: impl IntoIterator<Item = SettlementRecord>) {
        for record in records {
            debug!(kind = record.kind(), "Emitting record");
            self.sink.record(&record);
        }
    }

    /// Current time according to the engine clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Snapshot of the protocol configuration.
    #[must_use]
    pub fn config(&self) -> ProtocolConfig {
        self.lock().config.clone()
    }

    /// Fees available for withdrawal.
    #[must_use]
    pub fn fee_balance(&self) -> Amount {
        self.lock().fees.balance()
    }

    /// Fee ledger snapshot.
    #[must_use]
    pub fn fee_ledger(&self) -> FeeLedger {
        self.lock().fees
    }

    /// Value held for markets: net stakes received minus payouts made.
    #[must_use]
    pub fn escrow_balance(&self) -> Amount {
        self.lock().escrow
    }

    /// Snapshot of a live position.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::TokenDoesNotExist`] for unknown or claimed ids.
    pub fn position(&self, position_id: PositionId) -> Result<Position, SettlementError> {
        self.lock().positions.get(position_id).cloned()
    }

    /// Live positions currently owned by `owner`.
    #[must_use]
    pub fn positions_of(&self, owner: &AccountId) -> Vec<Position> {
        self.lock()
            .positions
            .iter()
            .filter(|p| p.owner() == owner)
            .cloned()
            .collect()
    }

    /// Live positions on `market_id`.
    #[must_use]
    pub fn positions_on(&self, market_id: &MarketId) -> Vec<Position> {
        self.lock()
            .positions
            .for_market(market_id)
            .cloned()
            .collect()
    }

    /// True once `position_id` has been claimed.
    #[must_use]
    pub fn is_claimed(&self, position_id: PositionId) -> bool {
        self.lock().positions.is_burned(position_id)
    }

    /// Snapshot of every market in id order.
    #[must_use]
    pub fn markets(&self) -> Vec<Market> {
        self.lock().markets.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::{MemoryLedger, MemoryOracle};
    use crate::domain::Outcome;
    use crate::testkit::fixtures::{alice, bob, price, protocol_config, units};
    use crate::testkit::Harness;
    use rust_decimal_macros::dec;

    fn build(config: ProtocolConfig) -> Result<SettlementEngine, SettlementError> {
        SettlementEngine::builder(
            config,
            Arc::new(MemoryOracle::new()),
            Arc::new(MemoryLedger::new()),
        )
        .build()
    }

    #[test]
    fn builder_validates_config() {
        assert!(build(protocol_config()).is_ok());

        let mut config = protocol_config();
        config.treasury = AccountId::zero();
        assert!(matches!(
            build(config),
            Err(SettlementError::ZeroAddressInput { field: "treasury" })
        ));

        let mut config = protocol_config();
        config.default_market_min_stake = config.global_min_stake - 1;
        assert!(matches!(
            build(config),
            Err(SettlementError::InvalidMinStake { .. })
        ));

        let mut config = protocol_config();
        config.max_price_staleness_secs = 0;
        assert!(matches!(
            build(config),
            Err(SettlementError::InvalidStalenessWindow)
        ));
    }

    #[test]
    fn fresh_engine_is_empty() {
        let engine = build(protocol_config()).unwrap();
        assert!(engine.markets().is_empty());
        assert_eq!(engine.escrow_balance(), 0);
        assert_eq!(engine.fee_ledger(), FeeLedger::default());
    }

    #[test]
    fn position_queries() {
        let h = Harness::new();
        let market = h.market("eth", price(dec!(3000)));
        let a = h
            .stake(&alice(), &market, Outcome::Above, units(dec!(1)))
            .unwrap();
        let b = h
            .stake(&bob(), &market, Outcome::AtOrBelow, units(dec!(2)))
            .unwrap();

        assert_eq!(h.engine.positions_on(&market).len(), 2);
        assert_eq!(h.engine.positions_of(&bob())[0].id(), b.position_id);
        assert_eq!(h.engine.position(a.position_id).unwrap().net_stake(), units(dec!(1)));
        assert_eq!(h.engine.escrow_balance(), units(dec!(3)));
        assert!(!h.engine.is_claimed(a.position_id));
    }
}
