//! Facade behavior: delegation, violations, and background lifecycle.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use switchboard_core::{
    ActionKind, AuditSettings, AuthFailure, ManualClock, RateLimitSettings, Secret,
    SecurityConfig, SecurityViolation, TokenSettings,
};
use switchboard_error::AuditError;
use switchboard_security::{
    AuditOutcome, AuditRecord, AuditSink, MemoryAuditSink, SecurityFacade,
};

const START_MS: u64 = 1_700_000_000_000;

fn token_settings() -> TokenSettings {
    TokenSettings::default().with_secret(Secret::new("facade-test-secret-0123456789abcdef"))
}

fn config() -> SecurityConfig {
    SecurityConfig::default()
        .with_tokens(token_settings())
        .with_rate_limits(RateLimitSettings::default().with_messages_per_minute(2))
        .with_audit(AuditSettings::default().with_batch_size(3))
}

fn facade(config: SecurityConfig) -> (SecurityFacade, Arc<ManualClock>, Arc<MemoryAuditSink>) {
    let clock = Arc::new(ManualClock::new(START_MS));
    let sink = Arc::new(MemoryAuditSink::new());
    let facade = SecurityFacade::with_parts(config, clock.clone(), sink.clone())
        .expect("config is valid");
    (facade, clock, sink)
}

fn record(n: u64) -> AuditRecord {
    AuditRecord::new(n, "a", "b", "send", AuditOutcome::Success, 1, "m")
}

/// Sink that takes a while to accept each batch.
#[derive(Debug, Default)]
struct SlowSink {
    inner: MemoryAuditSink,
}

#[async_trait]
impl AuditSink for SlowSink {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn publish(&self, batch: &[AuditRecord]) -> Result<(), AuditError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        self.inner.publish(batch).await
    }
}

#[test]
fn test_missing_secret_fails_construction() {
    assert!(SecurityFacade::new(SecurityConfig::default()).is_err());
}

#[test]
fn test_short_revocation_ttl_fails_construction() {
    let config = config().with_tokens(
        token_settings()
            .with_token_expiry_ms(72 * 3_600_000)
            .with_revocation_list_ttl_ms(48 * 3_600_000),
    );
    assert!(SecurityFacade::new(config).is_err());
}

#[test]
fn test_request_flow_in_caller_order() {
    let (security, _, _) = facade(config());
    let token = security
        .create_token("agent-1", "machine-A", vec!["send".into()])
        .unwrap();

    for _ in 0..2 {
        let claims = security.validate_token(&token).expect("token is valid");
        let decision = security.check_rate_limit(claims.agent_id(), ActionKind::Message);
        assert!(decision.allowed());
        assert!(security.validate_content_default("status: green").is_valid());
        security.record_action(claims.agent_id(), ActionKind::Message);
    }

    let decision = security.check_rate_limit("agent-1", ActionKind::Message);
    assert!(!decision.allowed());
    let violation = security.rate_limit_violation("agent-1", ActionKind::Message, &decision);
    match &violation {
        SecurityViolation::RateLimit {
            current_count,
            max_allowed,
            retry_after_ms,
            ..
        } => {
            assert_eq!(*current_count, 2);
            assert_eq!(*max_allowed, 2);
            assert_eq!(*retry_after_ms, 60_000);
        }
        other => panic!("unexpected violation {other:?}"),
    }
    assert!(violation.is_retryable());
    assert_eq!(*violation.base().timestamp(), START_MS);
}

#[test]
fn test_auth_violation_discloses_only_coarse_reason() {
    let (security, clock, _) = facade(config());
    let token = security.create_token("a", "m", Vec::new()).unwrap();
    clock.advance(86_400_000);

    let reason = security.check_token(Some(&token)).unwrap_err();
    assert_eq!(reason, AuthFailure::Expired);
    let violation = security.auth_violation("a", reason);
    assert_eq!(violation.message(), "Authentication failed: expired");
    assert!(!violation.message().contains(&token));
}

#[test]
fn test_content_violation_carries_every_error() {
    let (security, _, _) = facade(config());
    let result = security.validate_content("x && bash $(id)", 5);
    assert_eq!(result.errors().len(), 3);
    let violation = security.content_violation("a", result);
    match violation {
        SecurityViolation::Content { errors, base } => {
            assert_eq!(errors.len(), 3);
            assert_eq!(base.message(), "Content rejected: 3 rule(s) violated");
        }
        other => panic!("unexpected violation {other:?}"),
    }
}

#[test]
fn test_collaborator_pass_throughs() {
    let config = config()
        .with_paths(
            switchboard_core::PathGuardSettings::default()
                .with_allowed_roots(vec!["/srv/shared".into()]),
        );
    let (security, _, _) = facade(config);
    assert!(security.is_path_allowed("/srv/shared/notes.md"));
    assert!(!security.is_path_allowed("/srv/shared/../private"));
    assert!(!security.is_tool_allowed("a", "shell"));
    assert_eq!(security.directory_violation("a", "/etc").kind(), "directory");
    assert_eq!(security.tool_violation("a", "shell").kind(), "tool");
    assert!(security.validate_metadata(&json!({"k": "v"})).is_valid());
    assert!(security.generate_policy_sql("messages", "agent_id").is_ok());
    assert!(security.generate_policy_sql("messages;", "agent_id").is_err());
}

#[tokio::test(start_paused = true)]
async fn test_full_batch_wakes_background_flusher() {
    let (security, _, sink) = facade(config());
    security.start_background_tasks().unwrap();
    security.audit(record(1));
    security.audit(record(2));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(sink.records().is_empty());

    security.audit(record(3));
    assert!(sink.records().is_empty());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(sink.records().len(), 3);
    assert_eq!(security.audit_logger().buffered(), 0);
    security.shutdown().await;
}

#[tokio::test]
async fn test_audit_never_waits_on_sink() {
    let (security, _, sink) = facade(config());
    for n in 0..4 {
        security.audit(record(n));
    }
    assert!(sink.records().is_empty());
    assert_eq!(security.audit_logger().buffered(), 4);

    assert_eq!(*security.flush_audit().await.flushed(), 4);
    assert_eq!(sink.records().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_audit_failure_does_not_reach_caller() {
    let (security, _, sink) = facade(config());
    security.start_background_tasks().unwrap();
    sink.set_failing(true);
    for n in 0..3 {
        security.audit(record(n));
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(security.audit_logger().failed_flushes(), 1);
    assert_eq!(security.audit_logger().dropped_records(), 3);
    security.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_waits_for_flush_in_progress() {
    let clock = Arc::new(ManualClock::new(START_MS));
    let sink = Arc::new(SlowSink::default());
    let security = SecurityFacade::with_parts(config(), clock, sink.clone()).unwrap();
    security.start_background_tasks().unwrap();
    security.audit(record(1));

    // The timer flush starts at 5s and is still publishing at 5.1s.
    tokio::time::sleep(Duration::from_millis(5_100)).await;
    assert_eq!(security.audit_logger().buffered(), 0);
    assert!(sink.inner.records().is_empty());

    security.shutdown().await;
    assert_eq!(sink.inner.records().len(), 1);
    assert_eq!(security.audit_logger().flushed_records(), 1);
    assert_eq!(security.audit_logger().dropped_records(), 0);
}

#[tokio::test]
async fn test_shutdown_flushes_and_cleans_up_once() {
    let (security, clock, sink) = facade(config());
    security.start_background_tasks().unwrap();
    assert_eq!(security.background_task_count(), 2);

    security.audit(record(1));
    security.revoke_token("old");
    clock.advance(172_800_001);

    security.shutdown().await;
    assert!(security.is_shut_down());
    assert_eq!(security.background_task_count(), 0);
    assert_eq!(sink.records().len(), 1);
    assert!(!security.is_revoked("old"));

    security.shutdown().await;
    security.start_background_tasks().unwrap();
    assert_eq!(security.background_task_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_revocation_cleanup() {
    let config = config().with_tokens(
        token_settings()
            .with_token_expiry_ms(5_000)
            .with_revocation_list_ttl_ms(5_000)
            .with_cleanup_interval_ms(1_000),
    );
    let (security, clock, _) = facade(config);
    security.start_background_tasks().unwrap();
    security.start_background_tasks().unwrap();
    assert_eq!(security.background_task_count(), 2);

    security.revoke_token("old");
    clock.advance(10_000);
    tokio::time::sleep(Duration::from_millis(1_100)).await;

    assert!(!security.is_revoked("old"));
    security.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_periodic_audit_flush() {
    let (security, _, sink) = facade(config());
    security.start_background_tasks().unwrap();
    security.audit(record(1));

    tokio::time::sleep(Duration::from_millis(5_100)).await;
    assert_eq!(sink.records().len(), 1);
    security.shutdown().await;
}

#[test]
fn test_background_tasks_need_runtime() {
    let (security, _, _) = facade(config());
    assert!(security.start_background_tasks().is_err());
}
