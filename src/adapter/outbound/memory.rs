//! In-memory oracle and value ledger.
//!
//! Back the engine for scenario replay and tests. Both are safe to share
//! behind an `Arc` and to mutate while the engine holds a reference.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::{AccountId, Amount, FeedId, Price};
use crate::port::{OracleError, PriceOracle, PriceReading, TransferError, ValueTransfer};

/// Price oracle whose answers are set by hand.
#[derive(Debug, Default)]
pub struct MemoryOracle {
    readings: RwLock<HashMap<FeedId, PriceReading>>,
    outages: RwLock<HashSet<FeedId>>,
}

impl MemoryOracle {
    /// Create an oracle with no feeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a price for `feed`, replacing any earlier reading.
    pub fn set_price(&self, feed: &FeedId, price: Price, updated_at: DateTime<Utc>) {
        self.readings
            .write()
            .insert(feed.clone(), PriceReading { price, updated_at });
    }

    /// Make reads of `feed` fail until [`MemoryOracle::restore`] is called.
    pub fn fail(&self, feed: &FeedId) {
        self.outages.write().insert(feed.clone());
    }

    /// Clear an outage set with [`MemoryOracle::fail`].
    pub fn restore(&self, feed: &FeedId) {
        self.outages.write().remove(feed);
    }
}

impl PriceOracle for MemoryOracle {
    fn latest_price(&self, feed: &FeedId) -> Result<PriceReading, OracleError> {
        if self.outages.read().contains(feed) {
            return Err(OracleError::Unavailable(format!("feed {feed} is down")));
        }
        self.readings
            .read()
            .get(feed)
            .copied()
            .ok_or_else(|| OracleError::UnknownFeed { feed: feed.clone() })
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<AccountId, Amount>,
    rejecting: HashSet<AccountId>,
    paid_out: Amount,
}

/// Value medium that credits balances in memory.
///
/// Recipients can be marked as rejecting to exercise failed payouts.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every transfer to `account`.
    pub fn reject(&self, account: &AccountId) {
        self.state.write().rejecting.insert(account.clone());
    }

    /// Accept transfers to `account` again.
    pub fn accept(&self, account: &AccountId) {
        self.state.write().rejecting.remove(account);
    }

    /// Total credited to `account`.
    #[must_use]
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.state
            .read()
            .balances
            .get(account)
            .copied()
            .unwrap_or(0)
    }

    /// Sum of every successful transfer.
    #[must_use]
    pub fn total_paid(&self) -> Amount {
        self.state.read().paid_out
    }
}

impl ValueTransfer for MemoryLedger {
    fn transfer(&self, to: &AccountId, amount: Amount) -> Result<(), TransferError> {
        let mut state = self.state.write();
        if state.rejecting.contains(to) {
            return Err(TransferError::Rejected {
                recipient: to.clone(),
                reason: "recipient refuses value".to_string(),
            });
        }
        let balance = state.balances.get(to).copied().unwrap_or(0);
        let (Some(balance), Some(paid_out)) = (
            balance.checked_add(amount),
            state.paid_out.checked_add(amount),
        ) else {
            return Err(TransferError::Unavailable("ledger overflow".to_string()));
        };
        state.balances.insert(to.clone(), balance);
        state.paid_out = paid_out;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_reports_unknown_and_failed_feeds() {
        let oracle = MemoryOracle::new();
        let feed = FeedId::new("ETH/USD");
        assert!(matches!(
            oracle.latest_price(&feed),
            Err(OracleError::UnknownFeed { .. })
        ));

        let at = Utc::now();
        oracle.set_price(&feed, 42, at);
        assert_eq!(
            oracle.latest_price(&feed),
            Ok(PriceReading {
                price: 42,
                updated_at: at
            })
        );

        oracle.fail(&feed);
        assert!(matches!(
            oracle.latest_price(&feed),
            Err(OracleError::Unavailable(_))
        ));
        oracle.restore(&feed);
        assert!(oracle.latest_price(&feed).is_ok());
    }

    #[test]
    fn ledger_credits_and_rejects() {
        let ledger = MemoryLedger::new();
        let alice = AccountId::new("0xa11ce");

        ledger.transfer(&alice, 5).unwrap();
        ledger.transfer(&alice, 7).unwrap();
        assert_eq!(ledger.balance_of(&alice), 12);
        assert_eq!(ledger.total_paid(), 12);

        ledger.reject(&alice);
        let err = ledger.transfer(&alice, 1).unwrap_err();
        assert!(matches!(err, TransferError::Rejected { .. }));
        assert_eq!(ledger.balance_of(&alice), 12);

        ledger.accept(&alice);
        assert!(ledger.transfer(&alice, 1).is_ok());
    }
}
