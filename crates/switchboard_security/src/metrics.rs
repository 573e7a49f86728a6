//! OpenTelemetry counters for rejections and background work.
//!
//! Available with the `metrics` feature.

use crate::audit::FlushReport;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Meter},
};
use switchboard_core::{ActionKind, AuthFailure};
use tracing::debug;

/// Security counters, registered on the global meter provider.
#[derive(Clone)]
pub struct SecurityMetrics {
    /// Meter handle kept alive for metric instruments
    _meter: Meter,
    /// Rate limit checks that were denied
    pub rate_limit_rejections: Counter<u64>,
    /// Token checks that failed, by reason
    pub token_validation_failures: Counter<u64>,
    /// Revocation entries removed by cleanup
    pub revocations_purged: Counter<u64>,
    /// Content or metadata validations that failed
    pub content_rejections: Counter<u64>,
    /// Audit batches the sink rejected
    pub audit_flush_failures: Counter<u64>,
    /// Audit records delivered
    pub audit_records_flushed: Counter<u64>,
}

impl std::fmt::Debug for SecurityMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityMetrics").finish_non_exhaustive()
    }
}

impl SecurityMetrics {
    /// Create the instruments.
    pub fn new() -> Self {
        debug!("Getting global meter for switchboard_security");
        let meter = global::meter("switchboard_security");

        let rate_limit_rejections = meter
            .u64_counter("security.rate_limit.rejections")
            .with_description("Rate limit checks that were denied")
            .build();
        let token_validation_failures = meter
            .u64_counter("security.token.validation_failures")
            .with_description("Token checks that failed")
            .build();
        let revocations_purged = meter
            .u64_counter("security.token.revocations_purged")
            .with_description("Revocation entries removed by cleanup")
            .build();
        let content_rejections = meter
            .u64_counter("security.content.rejections")
            .with_description("Content or metadata validations that failed")
            .build();
        let audit_flush_failures = meter
            .u64_counter("security.audit.flush_failures")
            .with_description("Audit batches the sink rejected")
            .build();
        let audit_records_flushed = meter
            .u64_counter("security.audit.records_flushed")
            .with_description("Audit records delivered")
            .build();

        debug!("SecurityMetrics instruments created");
        Self {
            _meter: meter,
            rate_limit_rejections,
            token_validation_failures,
            revocations_purged,
            content_rejections,
            audit_flush_failures,
            audit_records_flushed,
        }
    }

    /// Record a denied rate limit check.
    pub fn record_rate_limit_rejection(&self, action: ActionKind) {
        self.rate_limit_rejections
            .add(1, &[KeyValue::new("action", action.to_string())]);
    }

    /// Record a failed token check.
    pub fn record_token_failure(&self, reason: AuthFailure) {
        self.token_validation_failures
            .add(1, &[KeyValue::new("reason", reason.to_string())]);
    }

    /// Record revocation cleanup.
    pub fn record_revocations_purged(&self, purged: usize) {
        if purged > 0 {
            self.revocations_purged.add(purged as u64, &[]);
        }
    }

    /// Record a failed validation of `subject` (`content` or `metadata`).
    pub fn record_content_rejection(&self, subject: &'static str) {
        self.content_rejections
            .add(1, &[KeyValue::new("subject", subject)]);
    }

    /// Record the outcome of an audit flush.
    pub fn record_flush(&self, report: &FlushReport) {
        if *report.flushed() > 0 {
            self.audit_records_flushed.add(*report.flushed() as u64, &[]);
        }
        if *report.failed_batches() > 0 {
            self.audit_flush_failures
                .add(*report.failed_batches() as u64, &[]);
        }
    }
}

impl Default for SecurityMetrics {
    fn default() -> Self {
        Self::new()
    }
}
