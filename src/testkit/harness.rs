//! Engine test harness.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::fixtures;
use crate::adapter::inbound::keeper::{self, Keeper, KeeperSettings};
use crate::adapter::outbound::clock::ManualClock;
use crate::adapter::outbound::memory::{MemoryLedger, MemoryOracle};
use crate::adapter::outbound::record::RecordingSink;
use crate::application::{ClaimReceipt, RewardDistributor, SettlementEngine, StakeReceipt};
use crate::domain::policy::required_value;
use crate::domain::{
    AccountId, Amount, BasisPoints, FeedId, MarketId, Outcome, PositionId, Price,
    ProtocolConfig, Resolution, SettlementError,
};
use crate::port::{Clock, RecordSink, RecordSinkRegistry};

/// Builder for [`Harness`].
pub struct HarnessBuilder {
    config: ProtocolConfig,
    start: DateTime<Utc>,
    sinks: Vec<Box<dyn RecordSink>>,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            config: fixtures::protocol_config(),
            start: fixtures::start_time(),
            sinks: Vec::new(),
        }
    }
}

impl HarnessBuilder {
    #[must_use]
    pub fn fee_bps(mut self, bps: BasisPoints) -> Self {
        self.config.fee_bps = bps;
        self
    }

    /// Set both the global and the default market minimum stake.
    #[must_use]
    pub fn min_stake(mut self, amount: Amount) -> Self {
        self.config.global_min_stake = amount;
        self.config.default_market_min_stake = amount;
        self
    }

    #[must_use]
    pub fn staleness_secs(mut self, secs: u64) -> Self {
        self.config.max_price_staleness_secs = secs;
        self
    }

    #[must_use]
    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    /// Also publish records to `sink`.
    #[must_use]
    pub fn sink(mut self, sink: Box<dyn RecordSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Build the harness.
    ///
    /// # Panics
    ///
    /// Panics if the configuration does not validate.
    #[must_use]
    pub fn build(self) -> Harness {
        let clock = Arc::new(ManualClock::new(self.start));
        let oracle = Arc::new(MemoryOracle::new());
        let ledger = Arc::new(MemoryLedger::new());
        let records = Arc::new(RecordingSink::new());

        let mut registry = RecordSinkRegistry::new();
        registry.register(Box::new(Arc::clone(&records)));
        for sink in self.sinks {
            registry.register(sink);
        }

        let engine = Arc::new(
            SettlementEngine::builder(self.config.clone(), oracle.clone(), ledger.clone())
                .clock(clock.clone())
                .record_sink(Arc::new(registry))
                .build()
                .expect("valid harness config"),
        );
        let distributor =
            RewardDistributor::new(Arc::clone(&engine), self.config.reward_distributor.clone());

        Harness {
            engine,
            clock,
            oracle,
            ledger,
            records,
            distributor,
        }
    }

    /// Build the harness together with a keeper fed by its records.
    #[must_use]
    pub fn build_with_keeper(self, settings: KeeperSettings) -> (Harness, Keeper) {
        let (feed, inbox) = keeper::channel();
        let harness = self.sink(Box::new(feed)).build();
        let keeper = Keeper::new(
            harness.engine.clone(),
            fixtures::resolver(),
            inbox,
            settings,
        );
        (harness, keeper)
    }
}

/// An engine with every collaborator exposed for inspection.
pub struct Harness {
    pub engine: Arc<SettlementEngine>,
    pub clock: Arc<ManualClock>,
    pub oracle: Arc<MemoryOracle>,
    pub ledger: Arc<MemoryLedger>,
    pub records: Arc<RecordingSink>,
    pub distributor: RewardDistributor,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// Harness with the default fixtures.
    #[must_use]
    pub fn new() -> Self {
        HarnessBuilder::default().build()
    }

    #[must_use]
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    /// Create an ETH/USD market expiring in one hour.
    ///
    /// # Panics
    ///
    /// Panics if the engine rejects the market.
    pub fn market(&self, id: &str, threshold: Price) -> MarketId {
        self.market_expiring(id, threshold, Duration::hours(1))
    }

    /// Create an ETH/USD market expiring after `ttl`.
    ///
    /// # Panics
    ///
    /// Panics if the engine rejects the market.
    pub fn market_expiring(&self, id: &str, threshold: Price, ttl: Duration) -> MarketId {
        let market_id = MarketId::new(id);
        self.engine
            .create_market(
                &fixtures::owner(),
                market_id.clone(),
                self.clock.now() + ttl,
                fixtures::eth_usd(),
                threshold,
            )
            .expect("market created");
        market_id
    }

    /// Stake `net_stake` with exactly the required value.
    pub fn stake(
        &self,
        user: &AccountId,
        market_id: &MarketId,
        outcome: Outcome,
        net_stake: Amount,
    ) -> Result<StakeReceipt, SettlementError> {
        let value = required_value(net_stake, self.engine.config().fee_bps)?;
        self.engine
            .record_prediction(user, market_id, outcome, net_stake, value)
    }

    /// Move the clock to the expiration of `market_id`.
    ///
    /// # Panics
    ///
    /// Panics for unknown markets.
    pub fn expire(&self, market_id: &MarketId) {
        let market = self
            .engine
            .market_details(market_id)
            .expect("known market");
        self.clock.set(market.expiration());
    }

    /// Publish a fresh `feed` price at the current time.
    pub fn publish(&self, feed: &FeedId, price: Price) {
        self.oracle.set_price(feed, price, self.clock.now());
    }

    /// Resolve from the oracle as the resolver.
    pub fn resolve(&self, market_id: &MarketId) -> Result<Resolution, SettlementError> {
        self.engine
            .resolve_from_oracle(&fixtures::resolver(), market_id)
    }

    /// Claim through the distributor as `user`.
    pub fn claim(
        &self,
        user: &AccountId,
        position_id: PositionId,
    ) -> Result<ClaimReceipt, SettlementError> {
        self.distributor.claim(user, position_id)
    }

    /// Escrow plus fee balance plus everything transferred out.
    ///
    /// Equals the total value ever received by the engine.
    #[must_use]
    pub fn accounted_value(&self) -> Amount {
        self.engine.escrow_balance() + self.engine.fee_balance() + self.ledger.total_paid()
    }
}
