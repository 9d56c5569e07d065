//! Time source port.

use chrono::{DateTime, Utc};

/// Current time as seen by the engine.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}
