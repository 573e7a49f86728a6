//! Library surface: configuration file to a working facade.

use std::io::Write;
use std::sync::Arc;
use switchboard::{
    ActionKind, AuditOutcome, AuditRecord, Clock, ManualClock, MemoryAuditSink, SecurityConfig,
    SecurityFacade, SecurityViolation,
};

#[tokio::test]
async fn test_facade_from_config_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[tokens]
secret = "library-test-secret-0123456789abcdef"

[rate_limits]
channel_creates_per_hour = 1

[tools]
default_allowed = ["read_file"]
"#
    )
    .unwrap();

    let config = SecurityConfig::load(Some(file.path())).unwrap();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let sink = Arc::new(MemoryAuditSink::new());
    let security = SecurityFacade::with_parts(config, clock.clone(), sink.clone()).unwrap();

    let token = security
        .create_token("planner", "host-1", vec!["channels".into()])
        .unwrap();
    let claims = security.validate_token(&token).unwrap();
    assert!(claims.has_capability("channels"));

    assert!(security.try_acquire("planner", ActionKind::ChannelCreate).allowed());
    let denied = security.try_acquire("planner", ActionKind::ChannelCreate);
    assert!(!denied.allowed());
    assert_eq!(denied.retry_after_ms(), 3_600_000);

    let violation = security.rate_limit_violation("planner", ActionKind::ChannelCreate, &denied);
    let json = serde_json::to_value(&violation).unwrap();
    assert_eq!(json["type"], "rate_limit");
    assert_eq!(json["action"], "channel_create");
    let back: SecurityViolation = serde_json::from_value(json).unwrap();
    assert_eq!(back, violation);

    assert!(security.is_tool_allowed("planner", "read_file"));
    assert!(!security.is_tool_allowed("planner", "shell"));

    security
        .audit(AuditRecord::new(
            clock.now_millis(),
            "planner",
            "builder",
            "channel_create",
            AuditOutcome::Denied,
            0,
            "host-1",
        ));
    security.shutdown().await;
    assert_eq!(sink.records().len(), 1);
    assert_eq!(*sink.records()[0].result(), AuditOutcome::Denied);
}
