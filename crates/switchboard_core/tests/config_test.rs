//! Tests for loading `SecurityConfig` from files.

use std::io::Write;
use switchboard_core::{ActionKind, SecurityConfig};

#[test]
fn test_load_from_toml_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[rate_limits]
messages_per_minute = 2

[tokens]
secret = "0123456789abcdef0123456789abcdef"
token_expiry_ms = 3600000
cleanup_interval_ms = 1000

[content]
max_message_size_bytes = 512

[paths]
allowed_roots = ["/srv/agents"]
"#
    )
    .unwrap();

    let config = SecurityConfig::load(Some(file.path())).unwrap();
    config.validate().unwrap();

    assert_eq!(
        *config.rate_limits().policy(ActionKind::Message).max_actions(),
        2
    );
    assert_eq!(*config.tokens().token_expiry_ms(), 3_600_000);
    assert_eq!(config.tokens().cleanup_interval().as_millis(), 1_000);
    assert_eq!(*config.content().max_message_size_bytes(), 512);
    assert_eq!(*config.content().max_metadata_keys(), 50);
    assert_eq!(config.paths().allowed_roots().len(), 1);
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let err = SecurityConfig::load(Some(&missing)).unwrap_err();
    assert!(err.message.contains("Failed to load configuration"));
}

#[test]
fn test_malformed_toml_is_config_error() {
    let err = SecurityConfig::from_toml_str("[rate_limits\nmessages_per_minute = ").unwrap_err();
    assert!(err.message.contains("Failed to parse config"));
}

#[test]
fn test_rendered_config_round_trips_without_secret() {
    let config = SecurityConfig::from_toml_str("[tokens]\nsecret = \"hunter2hunter2\"\n").unwrap();
    let rendered = config.to_toml_string().unwrap();
    assert!(!rendered.contains("hunter2"));

    let reparsed = SecurityConfig::from_toml_str(&rendered).unwrap();
    assert_eq!(reparsed.rate_limits(), config.rate_limits());
    assert_eq!(reparsed.content(), config.content());
}
