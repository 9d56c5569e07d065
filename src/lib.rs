//! Settlebook - pari-mutuel prediction market settlement.
//!
//! Users stake on whether an external price will be above a threshold at
//! a market's expiration. After expiration the market is resolved from a
//! price oracle and winners split the losing pool in proportion to their
//! net stakes.
//!
//! # Architecture
//!
//! - [`domain`] - Markets, positions, fee policy, payout arithmetic
//! - [`port`] - Traits for the oracle, value medium, clock, record sinks,
//!   and the two-stage automation contract
//! - [`application`] - [`application::SettlementEngine`] and its operations
//! - [`adapter`] - In-memory and logging adapters, the keeper, and the CLI
//! - [`infrastructure`] - TOML configuration and logging setup
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use chrono::{Duration, Utc};
//! use settlebook::adapter::outbound::memory::{MemoryLedger, MemoryOracle};
//! use settlebook::application::SettlementEngine;
//! use settlebook::domain::{AccountId, FeedId, MarketId, Outcome, ProtocolConfig};
//!
//! let owner = AccountId::new("0x01");
//! let config = ProtocolConfig {
//!     owner: owner.clone(),
//!     treasury: AccountId::new("0x02"),
//!     oracle_resolver: AccountId::new("0x03"),
//!     reward_distributor: AccountId::new("0x04"),
//!     fee_bps: 100,
//!     global_min_stake: 1_000,
//!     default_market_min_stake: 1_000,
//!     max_price_staleness_secs: 3_600,
//! };
//! let engine = SettlementEngine::builder(
//!     config,
//!     Arc::new(MemoryOracle::new()),
//!     Arc::new(MemoryLedger::new()),
//! )
//! .build()
//! .unwrap();
//!
//! let market = MarketId::new("eth-3000");
//! engine
//!     .create_market(&owner, market.clone(), Utc::now() + Duration::hours(1), FeedId::new("ETH/USD"), 3_000)
//!     .unwrap();
//!
//! let receipt = engine
//!     .record_prediction(&AccountId::new("0xa"), &market, Outcome::Above, 10_000, 10_100)
//!     .unwrap();
//! assert_eq!(receipt.fee, 100);
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
