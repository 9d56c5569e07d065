//! Price oracle port.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{FeedId, Price};

/// Latest answer of a price feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceReading {
    /// Fixed-point price in the feed's decimals.
    pub price: Price,
    /// When the feed last updated.
    pub updated_at: DateTime<Utc>,
}

/// Failure to obtain a reading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("unknown price feed {feed}")]
    UnknownFeed { feed: FeedId },

    #[error("price feed unavailable: {0}")]
    Unavailable(String),
}

/// Source of external prices.
///
/// Staleness policy belongs to the caller: implementations report the
/// feed's own update time and never filter by age.
pub trait PriceOracle: Send + Sync {
    /// Latest price and its update time for `feed`.
    fn latest_price(&self, feed: &FeedId) -> Result<PriceReading, OracleError>;
}
