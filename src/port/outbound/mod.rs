//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the engine's external collaborators: the price
//! oracle, the value-transfer medium, the clock, and record consumers.

pub mod clock;
pub mod oracle;
pub mod record;
pub mod transfer;
