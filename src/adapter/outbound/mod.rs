//! Outbound adapters (driven side).

pub mod clock;
pub mod memory;
pub mod record;
