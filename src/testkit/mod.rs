//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`fixtures`] - Canonical identities, feeds, amounts, and configuration.
//! - [`harness`] - An engine wired to manual clock, in-memory oracle and
//!   ledger, and a recording sink, with shortcuts for common flows.

pub mod fixtures;
pub mod harness;

pub use crate::adapter::outbound::clock::ManualClock;
pub use crate::adapter::outbound::memory::{MemoryLedger, MemoryOracle as ManualOracle};
pub use crate::adapter::outbound::record::RecordingSink;
pub use harness::{Harness, HarnessBuilder};
