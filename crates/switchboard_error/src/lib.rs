//! Error types for the switchboard agent security core.
//!
//! Every error carries the source location where it was created. Expected
//! rejections (rate limited, invalid token, bad content) are plain return
//! values in the component crates; the types here cover configuration,
//! exceptional failures, and the rejection taxonomy reported upstream.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod audit;
mod config;
mod security;
mod token;

pub use audit::{AuditError, AuditErrorKind};
pub use config::ConfigError;
pub use security::{SecurityError, SecurityErrorKind, SecurityResult};
pub use token::{TokenError, TokenErrorKind};

/// Any error produced by the switchboard crates.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SwitchboardError {
    /// Configuration error
    #[display("{}", _0)]
    Config(ConfigError),
    /// Token machinery error
    #[display("{}", _0)]
    Token(TokenError),
    /// Audit delivery error
    #[display("{}", _0)]
    Audit(AuditError),
    /// Request rejection
    #[display("{}", _0)]
    Security(SecurityError),
}

/// Result type for switchboard operations.
pub type SwitchboardResult<T> = Result<T, SwitchboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_is_captured() {
        let err = ConfigError::new("missing secret");
        assert!(err.file.ends_with("lib.rs"));
        assert!(err.line > 0);
    }

    #[test]
    fn test_aggregate_from() {
        let err: SwitchboardError = ConfigError::new("bad").into();
        assert!(matches!(err, SwitchboardError::Config(_)));
        assert!(err.to_string().contains("Configuration Error: bad"));
    }

    #[test]
    fn test_only_rate_limit_is_retryable() {
        let limited = SecurityErrorKind::RateLimitExceeded {
            action: "message".to_string(),
            retry_after_ms: 10,
        };
        assert!(limited.is_retryable());
        assert!(!SecurityErrorKind::InvalidToken("expired".to_string()).is_retryable());
        assert!(!SecurityErrorKind::ContentRejected(vec!["empty".to_string()]).is_retryable());
    }

    #[test]
    fn test_content_rejected_lists_every_rule() {
        let kind = SecurityErrorKind::ContentRejected(vec![
            "Content is empty".to_string(),
            "Content contains null bytes".to_string(),
        ]);
        assert_eq!(
            kind.to_string(),
            "Content rejected: Content is empty; Content contains null bytes"
        );
    }
}
