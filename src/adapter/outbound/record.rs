//! Record sink adapters.

use std::io::Write;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::domain::SettlementRecord;
use crate::port::RecordSink;

/// Mirrors every record to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRecordSink;

impl RecordSink for LogRecordSink {
    fn record(&self, record: &SettlementRecord) {
        let market_id = record.market_id().map(ToString::to_string);
        match serde_json::to_string(record) {
            Ok(payload) => info!(
                kind = record.kind(),
                market_id = market_id.as_deref().unwrap_or("-"),
                payload = %payload,
                "Settlement record"
            ),
            Err(e) => warn!(kind = record.kind(), error = %e, "Unserializable record"),
        }
    }
}

/// Writes each record as one JSON line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wrap `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn record(&self, record: &SettlementRecord) {
        let mut writer = self.writer.lock();
        let written = serde_json::to_writer(&mut *writer, record)
            .map_err(std::io::Error::from)
            .and_then(|()| writer.write_all(b"\n"))
            .and_then(|()| writer.flush());
        if let Err(e) = written {
            warn!(kind = record.kind(), error = %e, "Failed to write record");
        }
    }
}

/// Buffers records in memory until drained.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<SettlementRecord>>,
}

impl RecordingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every buffered record, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<SettlementRecord> {
        self.records.lock().clone()
    }

    /// Remove and return the buffered records.
    pub fn drain(&self) -> Vec<SettlementRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    /// Kinds of the buffered records, oldest first.
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.records.lock().iter().map(SettlementRecord::kind).collect()
    }

    /// Number of buffered records of `kind`.
    #[must_use]
    pub fn count(&self, kind: &str) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.kind() == kind)
            .count()
    }
}

impl RecordSink for RecordingSink {
    fn record(&self, record: &SettlementRecord) {
        self.records.lock().push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountId, PositionId};

    fn claimed() -> SettlementRecord {
        SettlementRecord::RewardClaimed {
            claimant: AccountId::new("0xb0b"),
            position_id: PositionId::new(1),
            payout: 3,
        }
    }

    #[test]
    fn json_lines_one_record_per_line() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.record(&claimed());
        sink.record(&claimed());

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["type"], "reward_claimed");
    }

    #[test]
    fn recording_sink_drains() {
        let sink = RecordingSink::new();
        sink.record(&claimed());
        assert_eq!(sink.count("reward_claimed"), 1);
        assert_eq!(sink.kinds(), vec!["reward_claimed"]);
        assert_eq!(sink.drain().len(), 1);
        assert!(sink.records().is_empty());
    }

    #[test]
    fn log_sink_accepts_records() {
        LogRecordSink.record(&claimed());
    }
}
