//! Record sink port for settlement records.
//!
//! This module defines the trait for publishing committed state
//! transitions to indexers, UIs, and the automation scheduler.

use std::sync::Arc;

use crate::domain::SettlementRecord;

/// Trait for record consumers.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - `record` is called after the engine releases its lock, once per
///   committed transition, in commit order
/// - Consumers must not call back into the engine synchronously
pub trait RecordSink: Send + Sync {
    /// Handle a record.
    fn record(&self, record: &SettlementRecord);
}

impl<T: RecordSink + ?Sized> RecordSink for Arc<T> {
    fn record(&self, record: &SettlementRecord) {
        (**self).record(record);
    }
}

/// Registry of record sinks (composite pattern).
///
/// Broadcasts records to all registered sinks.
pub struct RecordSinkRegistry {
    sinks: Vec<Box<dyn RecordSink>>,
}

impl RecordSinkRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { sinks: vec![] }
    }

    /// Register a sink.
    pub fn register(&mut self, sink: Box<dyn RecordSink>) {
        self.sinks.push(sink);
    }

    /// Number of registered sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl RecordSink for RecordSinkRegistry {
    fn record(&self, record: &SettlementRecord) {
        for sink in &self.sinks {
            sink.record(record);
        }
    }
}

impl Default for RecordSinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A sink that drops every record.
pub struct NullRecordSink;

impl RecordSink for NullRecordSink {
    fn record(&self, _record: &SettlementRecord) {}
}
