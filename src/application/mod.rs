//! Application services (use cases).
//!
//! Each file adds one group of operations to [`SettlementEngine`]; the
//! engine itself owns the state and the outbound ports.

pub mod admin;
pub mod automation;
pub mod claim;
pub mod distributor;
pub mod engine;
pub mod ledger;
pub mod registry;
pub mod resolution;

pub use claim::ClaimReceipt;
pub use distributor::RewardDistributor;
pub use engine::{SettlementEngine, SettlementEngineBuilder};
pub use ledger::StakeReceipt;
