//! Buffered audit trail delivered to a pluggable sink.
//!
//! Delivery failures never reach the request path: a failed batch is logged,
//! counted and dropped. Audit completeness is traded for availability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use switchboard_core::AuditSettings;
use switchboard_error::{AuditError, AuditErrorKind};
use tracing::{debug, info, instrument, trace, warn};

/// How an audited command ended.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditOutcome {
    /// Command ran
    Success,
    /// Command was rejected by a guard
    Denied,
    /// Command ran and failed
    Failed,
}

/// One audited command between two agents.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_new::new,
)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Milliseconds since the Unix epoch
    timestamp: u64,
    /// Agent that issued the command
    #[new(into)]
    sender_id: String,
    /// Agent the command was addressed to
    #[new(into)]
    receiver_id: String,
    /// Command name
    #[new(into)]
    command: String,
    /// Outcome
    result: AuditOutcome,
    /// Time the command took
    duration_ms: u64,
    /// Machine the sender runs on
    #[new(into)]
    machine_id: String,
}

/// Destination for audit batches.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Deliver a batch. An error drops the whole batch.
    async fn publish(&self, batch: &[AuditRecord]) -> Result<(), AuditError>;
}

/// Writes each record as a JSON line through `tracing` under the `switchboard::audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    async fn publish(&self, batch: &[AuditRecord]) -> Result<(), AuditError> {
        for record in batch {
            let line = serde_json::to_string(record)
                .map_err(|e| AuditError::new(AuditErrorKind::Serialization(e.to_string())))?;
            info!(target: "switchboard::audit", record = %line, "Audit record");
        }
        Ok(())
    }
}

/// Keeps delivered records in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
    failing: AtomicBool,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every delivered record.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Make subsequent publishes fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn publish(&self, batch: &[AuditRecord]) -> Result<(), AuditError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuditError::new(AuditErrorKind::Sink(
                "memory sink is failing".to_string(),
            )));
        }
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(batch);
        Ok(())
    }
}

/// Outcome of one flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_getters::Getters)]
pub struct FlushReport {
    /// Records the sink accepted
    flushed: usize,
    /// Batches the sink rejected
    failed_batches: usize,
    /// Records lost with rejected batches
    dropped: usize,
}

/// Bounded in-memory buffer in front of an [`AuditSink`].
pub struct AuditLogger {
    enabled: bool,
    batch_size: usize,
    max_buffered: usize,
    sink: Arc<dyn AuditSink>,
    buffer: Mutex<VecDeque<AuditRecord>>,
    failed_flushes: AtomicU64,
    dropped_records: AtomicU64,
    flushed_records: AtomicU64,
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("enabled", &self.enabled)
            .field("batch_size", &self.batch_size)
            .field("max_buffered", &self.max_buffered)
            .field("sink", &self.sink.name())
            .field("buffered", &self.buffered())
            .finish()
    }
}

impl AuditLogger {
    /// Create a logger delivering to `sink`.
    pub fn new(settings: &AuditSettings, sink: Arc<dyn AuditSink>) -> Self {
        Self {
            enabled: *settings.enabled(),
            batch_size: (*settings.batch_size()).max(1),
            max_buffered: (*settings.max_buffered()).max(1),
            sink,
            buffer: Mutex::new(VecDeque::new()),
            failed_flushes: AtomicU64::new(0),
            dropped_records: AtomicU64::new(0),
            flushed_records: AtomicU64::new(0),
        }
    }

    fn buffer(&self) -> MutexGuard<'_, VecDeque<AuditRecord>> {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether records are kept.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Buffer a record. Returns true once a full batch is waiting.
    ///
    /// At capacity the oldest buffered record is dropped.
    pub fn enqueue(&self, record: AuditRecord) -> bool {
        if !self.enabled {
            trace!("Audit disabled; discarding record");
            return false;
        }
        let mut buffer = self.buffer();
        if buffer.len() >= self.max_buffered {
            buffer.pop_front();
            self.dropped_records.fetch_add(1, Ordering::Relaxed);
            warn!(max_buffered = self.max_buffered, "Audit buffer full; dropped oldest record");
        }
        buffer.push_back(record);
        buffer.len() >= self.batch_size
    }

    /// Deliver everything buffered, one batch at a time.
    #[instrument(skip_all, fields(sink = self.sink.name()))]
    pub async fn flush(&self) -> FlushReport {
        let pending: Vec<AuditRecord> = self.buffer().drain(..).collect();
        let mut report = FlushReport::default();
        if pending.is_empty() {
            return report;
        }

        for batch in pending.chunks(self.batch_size) {
            match self.sink.publish(batch).await {
                Ok(()) => report.flushed += batch.len(),
                Err(e) => {
                    warn!(error = %e, records = batch.len(), "Audit flush failed; dropping batch");
                    report.failed_batches += 1;
                    report.dropped += batch.len();
                }
            }
        }

        self.flushed_records
            .fetch_add(report.flushed as u64, Ordering::Relaxed);
        self.failed_flushes
            .fetch_add(report.failed_batches as u64, Ordering::Relaxed);
        self.dropped_records
            .fetch_add(report.dropped as u64, Ordering::Relaxed);
        debug!(
            flushed = report.flushed,
            failed_batches = report.failed_batches,
            "Audit flush complete"
        );
        report
    }

    /// Records waiting for delivery.
    pub fn buffered(&self) -> usize {
        self.buffer().len()
    }

    /// Batches the sink has rejected since start.
    pub fn failed_flushes(&self) -> u64 {
        self.failed_flushes.load(Ordering::Relaxed)
    }

    /// Records lost to overflow or rejected batches since start.
    pub fn dropped_records(&self) -> u64 {
        self.dropped_records.load(Ordering::Relaxed)
    }

    /// Records delivered since start.
    pub fn flushed_records(&self) -> u64 {
        self.flushed_records.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u64) -> AuditRecord {
        AuditRecord::new(n, "alice", "bob", "send", AuditOutcome::Success, 3, "m1")
    }

    fn logger(batch_size: usize, max_buffered: usize) -> (AuditLogger, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        let settings = AuditSettings::default()
            .with_batch_size(batch_size)
            .with_max_buffered(max_buffered);
        (AuditLogger::new(&settings, sink.clone()), sink)
    }

    #[test]
    fn test_record_wire_shape() {
        let json = serde_json::to_value(record(7)).unwrap();
        assert_eq!(json["senderId"], "alice");
        assert_eq!(json["receiverId"], "bob");
        assert_eq!(json["durationMs"], 3);
        assert_eq!(json["machineId"], "m1");
        assert_eq!(json["result"], "success");
    }

    #[test]
    fn test_enqueue_signals_full_batch() {
        let (logger, _) = logger(2, 10);
        assert!(!logger.enqueue(record(1)));
        assert!(logger.enqueue(record(2)));
        assert_eq!(logger.buffered(), 2);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let (logger, _) = logger(100, 2);
        logger.enqueue(record(1));
        logger.enqueue(record(2));
        logger.enqueue(record(3));
        assert_eq!(logger.buffered(), 2);
        assert_eq!(logger.dropped_records(), 1);
    }

    #[tokio::test]
    async fn test_flush_delivers_in_batches() {
        let (logger, sink) = logger(2, 10);
        for n in 0..5 {
            logger.enqueue(record(n));
        }
        let report = logger.flush().await;
        assert_eq!(*report.flushed(), 5);
        assert_eq!(logger.buffered(), 0);
        let delivered: Vec<u64> = sink.records().iter().map(|r| *r.timestamp()).collect();
        assert_eq!(delivered, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_failed_batch_is_counted_and_dropped() {
        let (logger, sink) = logger(10, 10);
        sink.set_failing(true);
        logger.enqueue(record(1));
        logger.enqueue(record(2));

        let report = logger.flush().await;
        assert_eq!(*report.failed_batches(), 1);
        assert_eq!(*report.dropped(), 2);
        assert_eq!(logger.failed_flushes(), 1);
        assert_eq!(logger.dropped_records(), 2);
        assert_eq!(logger.buffered(), 0);

        sink.set_failing(false);
        logger.enqueue(record(3));
        assert_eq!(*logger.flush().await.flushed(), 1);
        assert_eq!(logger.flushed_records(), 1);
    }

    #[test]
    fn test_disabled_logger_keeps_nothing() {
        let sink = Arc::new(MemoryAuditSink::new());
        let logger = AuditLogger::new(&AuditSettings::default().with_enabled(false), sink);
        assert!(!logger.enqueue(record(1)));
        assert_eq!(logger.buffered(), 0);
    }
}
