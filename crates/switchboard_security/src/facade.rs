//! Single entry point over every security component.

use crate::audit::{AuditLogger, AuditRecord, AuditSink, FlushReport, TracingAuditSink};
#[cfg(feature = "metrics")]
use crate::metrics::SecurityMetrics;
use crate::path_guard::PathGuard;
use crate::policy_text::PolicyTextGenerator;
use crate::tool_policy::ToolPolicy;
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use switchboard_content::ContentValidator;
use switchboard_core::{
    ActionKind, AuthFailure, Clock, SecurityConfig, SecurityViolation, SystemClock,
    ValidationResult, ViolationBase,
};
use switchboard_error::{ConfigError, TokenError};
use switchboard_rate_limit::{RateLimitDecision, RateLimiter};
use switchboard_token::{TokenClaims, TokenManager};
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

/// Owns one of each security component, built from one [`SecurityConfig`].
///
/// Every operation delegates; the facade adds no policy of its own. Callers
/// are responsible for ordering checks: authenticate, then check the rate
/// limit, then validate content, then record the action, so rejected callers
/// never consume capacity.
///
/// Background work (revocation cleanup and audit flushing) starts with
/// [`SecurityFacade::start_background_tasks`] and stops with
/// [`SecurityFacade::shutdown`]. Its failures are logged and counted but
/// never surface on the request path, and no request-path operation waits
/// on the audit sink.
pub struct SecurityFacade {
    config: SecurityConfig,
    clock: Arc<dyn Clock>,
    rate_limiter: Arc<RateLimiter>,
    tokens: Arc<TokenManager>,
    content: ContentValidator,
    paths: PathGuard,
    tools: ToolPolicy,
    audit: Arc<AuditLogger>,
    policy_text: PolicyTextGenerator,
    background: Mutex<Vec<JoinHandle<()>>>,
    flush_requested: Arc<Notify>,
    stop: watch::Sender<bool>,
    shut_down: AtomicBool,
    #[cfg(feature = "metrics")]
    metrics: SecurityMetrics,
}

impl std::fmt::Debug for SecurityFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityFacade")
            .field("rate_limiter", &self.rate_limiter)
            .field("tokens", &self.tokens)
            .field("audit", &self.audit)
            .field("background_tasks", &self.background().len())
            .field("shut_down", &self.shut_down.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl SecurityFacade {
    /// Build from configuration with the system clock and the tracing audit sink.
    pub fn new(config: SecurityConfig) -> Result<Self, ConfigError> {
        Self::with_parts(config, Arc::new(SystemClock), Arc::new(TracingAuditSink))
    }

    /// Build with an explicit clock and audit sink.
    ///
    /// Fails when the configuration does not validate.
    #[instrument(skip_all, fields(sink = sink.name()))]
    pub fn with_parts(
        config: SecurityConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn AuditSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limits(), Arc::clone(&clock)));
        let tokens = Arc::new(TokenManager::new(config.tokens(), Arc::clone(&clock))?);
        let content = ContentValidator::new(config.content().clone());
        let paths = PathGuard::new(config.paths());
        let tools = ToolPolicy::new(config.tools());
        let audit = Arc::new(AuditLogger::new(config.audit(), sink));
        let (stop, _) = watch::channel(false);

        info!("Security facade initialized");
        Ok(Self {
            config,
            clock,
            rate_limiter,
            tokens,
            content,
            paths,
            tools,
            audit,
            policy_text: PolicyTextGenerator::default(),
            background: Mutex::new(Vec::new()),
            flush_requested: Arc::new(Notify::new()),
            stop,
            shut_down: AtomicBool::new(false),
            #[cfg(feature = "metrics")]
            metrics: SecurityMetrics::new(),
        })
    }

    fn background(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.background.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Effective configuration.
    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Underlying rate limiter.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Underlying token manager.
    pub fn token_manager(&self) -> &TokenManager {
        &self.tokens
    }

    /// Underlying content validator.
    pub fn content_validator(&self) -> &ContentValidator {
        &self.content
    }

    /// Underlying audit logger.
    pub fn audit_logger(&self) -> &AuditLogger {
        &self.audit
    }

    // Rate limiting

    /// See [`RateLimiter::check_limit`].
    pub fn check_rate_limit(&self, caller_id: &str, action: ActionKind) -> RateLimitDecision {
        let decision = self.rate_limiter.check_limit(caller_id, action);
        #[cfg(feature = "metrics")]
        if !decision.allowed() {
            self.metrics.record_rate_limit_rejection(action);
        }
        decision
    }

    /// See [`RateLimiter::record_action`].
    pub fn record_action(&self, caller_id: &str, action: ActionKind) {
        self.rate_limiter.record_action(caller_id, action);
    }

    /// See [`RateLimiter::try_acquire`].
    pub fn try_acquire(&self, caller_id: &str, action: ActionKind) -> RateLimitDecision {
        let decision = self.rate_limiter.try_acquire(caller_id, action);
        #[cfg(feature = "metrics")]
        if !decision.allowed() {
            self.metrics.record_rate_limit_rejection(action);
        }
        decision
    }

    /// See [`RateLimiter::reset_caller`].
    pub fn reset_caller(&self, caller_id: &str) {
        self.rate_limiter.reset_caller(caller_id);
    }

    /// See [`RateLimiter::current_count`].
    pub fn current_count(&self, caller_id: &str, action: ActionKind) -> u32 {
        self.rate_limiter.current_count(caller_id, action)
    }

    // Tokens

    /// See [`TokenManager::create_token`].
    pub fn create_token(
        &self,
        agent_id: &str,
        machine_id: &str,
        capabilities: Vec<String>,
    ) -> Result<String, TokenError> {
        self.tokens.create_token(agent_id, machine_id, capabilities)
    }

    /// See [`TokenManager::validate_token`].
    pub fn validate_token(&self, token: &str) -> Option<TokenClaims> {
        self.check_token(Some(token)).ok()
    }

    /// See [`TokenManager::check_token`].
    pub fn check_token(&self, token: Option<&str>) -> Result<TokenClaims, AuthFailure> {
        let result = self.tokens.check_token(token);
        #[cfg(feature = "metrics")]
        if let Err(reason) = &result {
            self.metrics.record_token_failure(*reason);
        }
        result
    }

    /// See [`TokenManager::refresh_token`].
    pub fn refresh_token(&self, token: &str) -> Result<Option<String>, TokenError> {
        self.tokens.refresh_token(token)
    }

    /// See [`TokenManager::revoke_token`].
    pub fn revoke_token(&self, jti: &str) {
        self.tokens.revoke_token(jti);
    }

    /// See [`TokenManager::is_revoked`].
    pub fn is_revoked(&self, jti: &str) -> bool {
        self.tokens.is_revoked(jti)
    }

    /// See [`TokenManager::get_token_id`].
    pub fn get_token_id(&self, token: &str) -> Option<String> {
        self.tokens.get_token_id(token)
    }

    /// See [`TokenManager::cleanup_revocation_list`].
    pub fn cleanup_revocation_list(&self) -> usize {
        let purged = self.tokens.cleanup_revocation_list();
        #[cfg(feature = "metrics")]
        self.metrics.record_revocations_purged(purged);
        purged
    }

    // Content

    /// See [`ContentValidator::validate_content`].
    pub fn validate_content(&self, text: &str, max_size_bytes: usize) -> ValidationResult {
        let result = self.content.validate_content(text, max_size_bytes);
        #[cfg(feature = "metrics")]
        if !result.is_valid() {
            self.metrics.record_content_rejection("content");
        }
        result
    }

    /// Validate content against the configured size cap.
    pub fn validate_content_default(&self, text: &str) -> ValidationResult {
        self.validate_content(text, *self.config.content().max_message_size_bytes())
    }

    /// See [`ContentValidator::sanitize_content`].
    pub fn sanitize_content(&self, text: &str) -> String {
        self.content.sanitize_content(text)
    }

    /// See [`ContentValidator::validate_metadata`].
    pub fn validate_metadata(&self, metadata: &Value) -> ValidationResult {
        let result = self.content.validate_metadata(metadata);
        #[cfg(feature = "metrics")]
        if !result.is_valid() {
            self.metrics.record_content_rejection("metadata");
        }
        result
    }

    // Collaborators

    /// See [`PathGuard::is_path_allowed`].
    pub fn is_path_allowed(&self, path: impl AsRef<Path>) -> bool {
        self.paths.is_path_allowed(path)
    }

    /// See [`ToolPolicy::is_tool_allowed`].
    pub fn is_tool_allowed(&self, agent_id: &str, tool_name: &str) -> bool {
        self.tools.is_tool_allowed(agent_id, tool_name)
    }

    /// Buffer an audit record without waiting on the sink.
    ///
    /// A full batch wakes the background flusher. Without background tasks
    /// records wait for [`SecurityFacade::flush_audit`] or shutdown.
    pub fn audit(&self, record: AuditRecord) {
        if self.audit.enqueue(record) {
            debug!("Audit batch full; waking flusher");
            self.flush_requested.notify_one();
        }
    }

    /// Deliver every buffered audit record now.
    pub async fn flush_audit(&self) -> FlushReport {
        let report = self.audit.flush().await;
        #[cfg(feature = "metrics")]
        self.metrics.record_flush(&report);
        report
    }

    /// See [`PolicyTextGenerator::generate`].
    pub fn generate_policy_sql(&self, table: &str, agent_column: &str) -> Result<String, ConfigError> {
        self.policy_text.generate(table, agent_column)
    }

    // Violations

    fn violation_base(&self, agent_id: &str, message: String) -> ViolationBase {
        ViolationBase::new(self.clock.now_millis(), agent_id, message)
    }

    /// Violation for a denied rate limit decision.
    pub fn rate_limit_violation(
        &self,
        agent_id: &str,
        action: ActionKind,
        decision: &RateLimitDecision,
    ) -> SecurityViolation {
        SecurityViolation::RateLimit {
            base: self.violation_base(
                agent_id,
                format!(
                    "Rate limit exceeded for {}: {} of {} used, retry after {} ms",
                    action,
                    decision.current_count(),
                    decision.max_allowed(),
                    decision.retry_after_ms()
                ),
            ),
            action,
            current_count: decision.current_count(),
            max_allowed: decision.max_allowed(),
            retry_after_ms: decision.retry_after_ms(),
        }
    }

    /// Violation for a failed authentication.
    pub fn auth_violation(&self, agent_id: &str, reason: AuthFailure) -> SecurityViolation {
        SecurityViolation::Auth {
            base: self.violation_base(agent_id, format!("Authentication failed: {}", reason)),
            reason,
        }
    }

    /// Violation carrying every error of a failed validation.
    pub fn content_violation(&self, agent_id: &str, result: ValidationResult) -> SecurityViolation {
        let errors = result.into_errors();
        SecurityViolation::Content {
            base: self.violation_base(
                agent_id,
                format!("Content rejected: {} rule(s) violated", errors.len()),
            ),
            errors,
        }
    }

    /// Violation for a path outside the allowlist.
    pub fn directory_violation(&self, agent_id: &str, path: impl AsRef<Path>) -> SecurityViolation {
        SecurityViolation::Directory {
            base: self.violation_base(agent_id, "Path is outside the allowed directories".to_string()),
            path: path.as_ref().display().to_string(),
        }
    }

    /// Violation for a tool outside the agent's policy.
    pub fn tool_violation(&self, agent_id: &str, tool_name: &str) -> SecurityViolation {
        SecurityViolation::Tool {
            base: self.violation_base(agent_id, format!("Tool {} is not allowed", tool_name)),
            tool_name: tool_name.to_string(),
        }
    }

    // Lifecycle

    /// Spawn periodic revocation cleanup and, when audit is enabled, periodic
    /// audit flushing. Must be called inside a Tokio runtime. Calling again
    /// while tasks run, or after shutdown, does nothing.
    #[instrument(skip(self))]
    pub fn start_background_tasks(&self) -> Result<(), ConfigError> {
        if self.shut_down.load(Ordering::SeqCst) {
            debug!("Facade is shut down; not starting background tasks");
            return Ok(());
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ConfigError::new("Background tasks require a Tokio runtime"))?;

        let mut background = self.background();
        if !background.is_empty() {
            debug!("Background tasks already running");
            return Ok(());
        }

        let cleanup_interval = self.config.tokens().cleanup_interval();
        let tokens = Arc::clone(&self.tokens);
        let mut stop = self.stop.subscribe();
        #[cfg(feature = "metrics")]
        let metrics = self.metrics.clone();
        background.push(runtime.spawn(async move {
            let mut timer = periodic(cleanup_interval);
            loop {
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = timer.tick() => {
                        let purged = tokens.cleanup_revocation_list();
                        #[cfg(feature = "metrics")]
                        metrics.record_revocations_purged(purged);
                        debug!(purged, "Periodic revocation cleanup");
                    }
                }
            }
            debug!("Revocation cleanup stopped");
        }));
        info!(?cleanup_interval, "Revocation cleanup scheduled");

        if self.audit.is_enabled() {
            let flush_interval = self.config.audit().flush_interval();
            let audit = Arc::clone(&self.audit);
            let flush_requested = Arc::clone(&self.flush_requested);
            let mut stop = self.stop.subscribe();
            #[cfg(feature = "metrics")]
            let metrics = self.metrics.clone();
            background.push(runtime.spawn(async move {
                let mut timer = periodic(flush_interval);
                loop {
                    // A flush in progress always completes; stop is only seen between flushes.
                    tokio::select! {
                        _ = stop.changed() => break,
                        _ = timer.tick() => {}
                        _ = flush_requested.notified() => {}
                    }
                    let report = audit.flush().await;
                    #[cfg(feature = "metrics")]
                    metrics.record_flush(&report);
                    if *report.failed_batches() > 0 {
                        warn!(
                            failed_batches = report.failed_batches(),
                            total_failed = audit.failed_flushes(),
                            "Background audit flush lost records"
                        );
                    }
                }
                debug!("Audit flusher stopped");
            }));
            info!(?flush_interval, "Audit flush scheduled");
        }
        Ok(())
    }

    /// Number of running background tasks.
    pub fn background_task_count(&self) -> usize {
        self.background().len()
    }

    /// Whether [`SecurityFacade::shutdown`] has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Stop background work, then flush the audit buffer and purge expired
    /// revocations one last time. Idempotent.
    ///
    /// Background tasks are signalled and awaited rather than aborted, so a
    /// flush already under way is delivered or counted before this returns.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            debug!("Security facade already shut down");
            return;
        }

        self.stop.send_replace(true);
        let handles = std::mem::take(&mut *self.background());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Background task ended abnormally");
            }
        }

        let report = self.flush_audit().await;
        let purged = self.cleanup_revocation_list();
        info!(
            flushed = report.flushed(),
            dropped = report.dropped(),
            purged,
            "Security facade shut down"
        );
    }
}

impl Drop for SecurityFacade {
    fn drop(&mut self) {
        for handle in self.background().drain(..) {
            handle.abort();
        }
    }
}

/// Interval whose first tick is one period from now.
fn periodic(period: Duration) -> tokio::time::Interval {
    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}
