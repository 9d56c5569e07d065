//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems (price feeds, the value medium, schedulers, indexers).
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │   Settlement engine     │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │ Oracle  │            │  Transfer   │              │  Record   │
//! │ Adapter │            │   Adapter   │              │   Sinks   │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`outbound::oracle::PriceOracle`] - Latest price and update time per feed
//! - [`outbound::transfer::ValueTransfer`] - Payouts and fee withdrawals
//! - [`outbound::clock::Clock`] - Current time
//! - [`outbound::record::RecordSink`] - Committed state transitions
//! - [`inbound::automation::Automation`] - Two-stage expiration/resolution

pub mod inbound;
pub mod outbound;

pub use inbound::automation::{Automation, ExpirationUpkeep, ResolutionRequest};
pub use outbound::clock::Clock;
pub use outbound::oracle::{OracleError, PriceOracle, PriceReading};
pub use outbound::record::{NullRecordSink, RecordSink, RecordSinkRegistry};
pub use outbound::transfer::{TransferError, ValueTransfer};
