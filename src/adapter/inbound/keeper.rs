//! In-process automation keeper.
//!
//! Drives both automation stages on a fixed interval:
//!
//! 1. every open market is checked in batches of `max_batch`; expired
//!    ones are announced through `perform_expiration`
//! 2. `MarketExpired` records arrive through a [`KeeperFeed`] registered
//!    on the engine's record sink, are turned into resolution requests,
//!    and resolved against the oracle
//!
//! Requests that fail with a retryable error stay queued for the next
//! tick. Markets announced earlier but still unresolved are requeued from
//! stage 1, so a dropped request or a restarted keeper picks them up
//! again. The loop stops when the shutdown channel flips to `true`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::domain::{AccountId, SettlementError, SettlementRecord};
use crate::port::{Automation, RecordSink, ResolutionRequest};

/// Record sink half of the keeper: forwards `MarketExpired` records.
#[derive(Debug, Clone)]
pub struct KeeperFeed {
    tx: mpsc::UnboundedSender<SettlementRecord>,
}

impl RecordSink for KeeperFeed {
    fn record(&self, record: &SettlementRecord) {
        if matches!(record, SettlementRecord::MarketExpired { .. })
            && self.tx.send(record.clone()).is_err()
        {
            debug!("Keeper inbox closed, dropping record");
        }
    }
}

/// Receiving half of [`KeeperFeed`].
#[derive(Debug)]
pub struct KeeperInbox {
    rx: mpsc::UnboundedReceiver<SettlementRecord>,
}

/// Create a connected feed and inbox.
///
/// Register the feed on the engine before building it, then hand the
/// inbox to [`Keeper::new`].
#[must_use]
pub fn channel() -> (KeeperFeed, KeeperInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (KeeperFeed { tx }, KeeperInbox { rx })
}

/// Keeper tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeeperSettings {
    pub interval: Duration,
    /// Markets checked per stage-one call.
    pub max_batch: usize,
}

impl Default for KeeperSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_batch: 50,
        }
    }
}

/// Summary of one keeper pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Markets announced as expired.
    pub announced: usize,
    /// Markets resolved.
    pub resolved: usize,
    /// Requests left queued for the next tick.
    pub retrying: usize,
    /// Requests abandoned for a non-retryable reason.
    pub dropped: usize,
}

/// Two-stage automation scheduler.
pub struct Keeper {
    automation: Arc<dyn Automation>,
    identity: AccountId,
    settings: KeeperSettings,
    inbox: Mutex<KeeperInbox>,
    pending: Mutex<VecDeque<ResolutionRequest>>,
}

impl Keeper {
    /// Create a keeper resolving as `identity`.
    #[must_use]
    pub fn new(
        automation: Arc<dyn Automation>,
        identity: AccountId,
        inbox: KeeperInbox,
        settings: KeeperSettings,
    ) -> Self {
        Self {
            automation,
            identity,
            settings,
            inbox: Mutex::new(inbox),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Requests waiting for a retry.
    #[must_use]
    pub fn pending(&self) -> Vec<ResolutionRequest> {
        self.pending.lock().iter().cloned().collect()
    }

    /// Run one pass of both stages.
    pub fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        let mut recovered = Vec::new();
        let candidates = self.automation.unresolved_markets();
        for batch in candidates.chunks(self.settings.max_batch.max(1)) {
            if let Some(upkeep) = self.automation.check_expirations(batch) {
                recovered.extend(self.automation.announced_requests(&upkeep));
                report.announced += self.automation.perform_expiration(&upkeep).len();
            }
        }

        let mut pending = self.pending.lock();
        for request in recovered {
            if !pending.contains(&request) {
                pending.push_back(request);
            }
        }
        {
            let mut inbox = self.inbox.lock();
            while let Ok(record) = inbox.rx.try_recv() {
                if let Some(request) = self.automation.check_expired_record(&record) {
                    if !pending.contains(&request) {
                        pending.push_back(request);
                    }
                }
            }
        }

        let mut retry = VecDeque::new();
        while let Some(request) = pending.pop_front() {
            match self
                .automation
                .perform_resolution(&self.identity, &request)
            {
                Ok(resolution) => {
                    report.resolved += 1;
                    info!(
                        market_id = %request.market_id,
                        outcome = %resolution.outcome,
                        "Keeper resolved market"
                    );
                }
                Err(SettlementError::MarketAlreadyResolved { .. }) => {
                    debug!(market_id = %request.market_id, "Already resolved");
                }
                Err(e) if e.is_retryable() => {
                    warn!(market_id = %request.market_id, error = %e, "Resolution deferred");
                    retry.push_back(request);
                }
                Err(e) => {
                    report.dropped += 1;
                    warn!(market_id = %request.market_id, error = %e, "Resolution abandoned");
                }
            }
        }
        report.retrying = retry.len();
        *pending = retry;

        debug!(
            announced = report.announced,
            resolved = report.resolved,
            retrying = report.retrying,
            "Keeper tick complete"
        );
        report
    }

    /// Tick on the configured interval until `shutdown` becomes `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.settings.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(interval_secs = self.settings.interval.as_secs(), "Keeper started");

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    match result {
                        Ok(()) => {
                            if *shutdown.borrow() {
                                info!("Keeper shutdown signal received");
                                break;
                            }
                        }
                        Err(_) => {
                            info!("Keeper shutdown channel closed");
                            break;
                        }
                    }
                }
                _ = interval.tick() => {
                    self.tick();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketId, Outcome};
    use crate::testkit::fixtures::{alice, bob, eth_usd, price, units};
    use crate::testkit::Harness;
    use crate::port::Clock;
    use chrono::Duration as TimeDelta;
    use rust_decimal_macros::dec;

    fn settings(max_batch: usize) -> KeeperSettings {
        KeeperSettings {
            interval: Duration::from_millis(10),
            max_batch,
        }
    }

    #[test]
    fn feed_forwards_only_expirations() {
        let (feed, mut inbox) = channel();
        feed.record(&SettlementRecord::ConfigUpdated {
            field: "fee_bps".into(),
            value: "0".into(),
        });
        feed.record(&SettlementRecord::MarketExpired {
            market_id: MarketId::new("eth"),
            expiration: chrono::Utc::now(),
        });
        let received = inbox.rx.try_recv().unwrap();
        assert_eq!(received.kind(), "market_expired");
        assert!(inbox.rx.try_recv().is_err());
    }

    #[test]
    fn idle_tick_does_nothing() {
        let (h, keeper) = Harness::builder().build_with_keeper(settings(10));
        h.market("eth", price(dec!(3000)));
        assert_eq!(keeper.tick(), TickReport::default());
    }

    #[test]
    fn announces_and_resolves_in_one_tick() {
        let (h, keeper) = Harness::builder().build_with_keeper(settings(1));
        let first = h.market("eth", price(dec!(3000)));
        let second = h.market("eth-2", price(dec!(3500)));
        h.stake(&alice(), &first, Outcome::AtOrBelow, units(dec!(1)))
            .unwrap();
        h.stake(&bob(), &first, Outcome::Above, units(dec!(2)))
            .unwrap();

        h.expire(&first);
        h.publish(&eth_usd(), price(dec!(3100)));
        let report = keeper.tick();
        assert_eq!(report.announced, 2);
        assert_eq!(report.resolved, 2);
        assert!(keeper.pending().is_empty());

        let first = h.engine.market_details(&first).unwrap();
        assert_eq!(first.winning_outcome(), Some(Outcome::Above));
        let second = h.engine.market_details(&second).unwrap();
        assert_eq!(second.winning_outcome(), Some(Outcome::AtOrBelow));
        assert_eq!(keeper.tick(), TickReport::default());
    }

    #[test]
    fn stale_price_is_retried_until_fresh() {
        let (h, keeper) = Harness::builder().build_with_keeper(settings(10));
        let market = h.market("eth", price(dec!(3000)));
        h.expire(&market);
        h.oracle.set_price(
            &eth_usd(),
            price(dec!(3100)),
            h.clock.now() - TimeDelta::hours(2),
        );

        let report = keeper.tick();
        assert_eq!(report.announced, 1);
        assert_eq!(report.resolved, 0);
        assert_eq!(report.retrying, 1);
        assert_eq!(keeper.pending()[0].market_id, market);

        h.oracle.fail(&eth_usd());
        assert_eq!(keeper.tick().retrying, 1);

        h.oracle.restore(&eth_usd());
        h.publish(&eth_usd(), price(dec!(3100)));
        let report = keeper.tick();
        assert_eq!(report.announced, 0);
        assert_eq!(report.resolved, 1);
        assert!(keeper.pending().is_empty());
        assert_eq!(h.records.count("market_expired"), 1);
    }

    #[test]
    fn manual_resolution_clears_queue_silently() {
        let (h, keeper) = Harness::builder().build_with_keeper(settings(10));
        let market = h.market("eth", price(dec!(3000)));
        h.expire(&market);
        assert_eq!(keeper.tick().retrying, 1);

        h.engine
            .resolve_market(
                &crate::testkit::fixtures::resolver(),
                &market,
                Outcome::Above,
                price(dec!(3200)),
            )
            .unwrap();
        let report = keeper.tick();
        assert_eq!(report.resolved, 0);
        assert_eq!(report.dropped, 0);
        assert!(keeper.pending().is_empty());
    }

    #[test]
    fn unauthorized_keeper_drops_requests() {
        let (feed, inbox) = channel();
        let h = Harness::builder().sink(Box::new(feed)).build();
        let keeper = Keeper::new(h.engine.clone(), alice(), inbox, settings(10));
        let market = h.market("eth", price(dec!(3000)));
        h.expire(&market);
        h.publish(&eth_usd(), price(dec!(3100)));

        let report = keeper.tick();
        assert_eq!(report.dropped, 1);
        assert!(keeper.pending().is_empty());
        assert!(!h.engine.market_details(&market).unwrap().is_resolved());
    }

    #[test]
    fn dropped_request_recovers_once_authorized() {
        let (feed, inbox) = channel();
        let h = Harness::builder().sink(Box::new(feed)).build();
        let keeper = Keeper::new(h.engine.clone(), alice(), inbox, settings(10));
        let market = h.market("eth", price(dec!(3000)));
        h.expire(&market);
        h.publish(&eth_usd(), price(dec!(3100)));
        assert_eq!(keeper.tick().dropped, 1);

        h.engine
            .set_oracle_resolver(&crate::testkit::fixtures::owner(), alice())
            .unwrap();
        let report = keeper.tick();
        assert_eq!(report.announced, 0);
        assert_eq!(report.resolved, 1);
        assert_eq!(h.records.count("market_expired"), 1);
        assert!(h.engine.market_details(&market).unwrap().is_resolved());
    }

    #[test]
    fn restarted_keeper_resumes_announced_market() {
        let (h, keeper) = Harness::builder().build_with_keeper(settings(10));
        let market = h.market("eth", price(dec!(3000)));
        h.expire(&market);
        assert_eq!(keeper.tick().retrying, 1);
        drop(keeper);

        let (_feed, inbox) = channel();
        let restarted = Keeper::new(
            h.engine.clone(),
            crate::testkit::fixtures::resolver(),
            inbox,
            settings(10),
        );
        h.publish(&eth_usd(), price(dec!(2900)));
        let report = restarted.tick();
        assert_eq!(report.announced, 0);
        assert_eq!(report.resolved, 1);
        let market = h.engine.market_details(&market).unwrap();
        assert_eq!(market.winning_outcome(), Some(Outcome::AtOrBelow));
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let (h, keeper) = Harness::builder().build_with_keeper(settings(10));
        let market = h.market("eth", price(dec!(3000)));
        h.expire(&market);
        h.publish(&eth_usd(), price(dec!(2900)));

        let (tx, rx) = watch::channel(false);
        let stop = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tx.send(true).unwrap();
        };
        tokio::join!(keeper.run(rx), stop);

        assert!(h.engine.market_details(&market).unwrap().is_resolved());
    }

    #[tokio::test]
    async fn run_stops_when_sender_dropped() {
        let (_h, keeper) = Harness::builder().build_with_keeper(settings(10));
        let (tx, rx) = watch::channel(false);
        drop(tx);
        keeper.run(rx).await;
    }
}
