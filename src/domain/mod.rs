//! Settlement domain: markets, positions, policy, and payout arithmetic.
//!
//! Everything here is pure and synchronous. Side effects (transfers, oracle
//! reads, record emission) go through [`crate::port`].

pub mod error;
pub mod id;
pub mod market;
pub mod money;
pub mod payout;
pub mod policy;
pub mod position;
pub mod protocol;
pub mod record;

pub use error::{ErrorCategory, SettlementError};
pub use id::{AccountId, FeedId, MarketId, PositionId};
pub use market::{Market, MarketRegistry, Outcome, Pools, Resolution};
pub use money::{Amount, BasisPoints, Price};
pub use position::{Position, PositionBook};
pub use protocol::{FeeLedger, ProtocolConfig};
pub use record::SettlementRecord;
