//! Reportable security violations.

use crate::ActionKind;
use serde::{Deserialize, Serialize};
use switchboard_error::{SecurityError, SecurityErrorKind};

/// Coarse reason an authentication attempt failed.
///
/// This is the only level at which the reason is disclosed; raw token
/// validation returns a uniform invalid result.
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
pub enum AuthFailure {
    /// No token was presented
    Missing,
    /// Token is malformed, forged, or lacks required claims
    Invalid,
    /// Token is past its expiry
    Expired,
    /// Token id is in the revocation set
    Revoked,
}

/// Fields shared by every violation.
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
pub struct ViolationBase {
    /// Milliseconds since the Unix epoch
    timestamp: u64,
    /// Agent the violation is attributed to
    #[new(into)]
    agent_id: String,
    /// Human-readable summary
    #[new(into)]
    message: String,
}

/// A rejected request, tagged by which guard rejected it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecurityViolation {
    /// Access to a path outside the directory allowlist
    Directory {
        /// Shared fields
        #[serde(flatten)]
        base: ViolationBase,
        /// Requested path
        path: String,
    },
    /// Use of a tool outside the agent's policy
    Tool {
        /// Shared fields
        #[serde(flatten)]
        base: ViolationBase,
        /// Requested tool
        tool_name: String,
    },
    /// Sliding-window limit reached
    RateLimit {
        /// Shared fields
        #[serde(flatten)]
        base: ViolationBase,
        /// Limited action
        action: ActionKind,
        /// Actions currently inside the window
        current_count: u32,
        /// Configured maximum
        max_allowed: u32,
        /// Milliseconds until capacity frees up
        retry_after_ms: u64,
    },
    /// Authentication failed
    Auth {
        /// Shared fields
        #[serde(flatten)]
        base: ViolationBase,
        /// Coarse failure reason
        reason: AuthFailure,
    },
    /// Content failed validation
    Content {
        /// Shared fields
        #[serde(flatten)]
        base: ViolationBase,
        /// Every violated rule
        errors: Vec<String>,
    },
}

impl SecurityViolation {
    /// Tag of this violation as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            SecurityViolation::Directory { .. } => "directory",
            SecurityViolation::Tool { .. } => "tool",
            SecurityViolation::RateLimit { .. } => "rate_limit",
            SecurityViolation::Auth { .. } => "auth",
            SecurityViolation::Content { .. } => "content",
        }
    }

    /// Shared fields.
    pub fn base(&self) -> &ViolationBase {
        match self {
            SecurityViolation::Directory { base, .. }
            | SecurityViolation::Tool { base, .. }
            | SecurityViolation::RateLimit { base, .. }
            | SecurityViolation::Auth { base, .. }
            | SecurityViolation::Content { base, .. } => base,
        }
    }

    /// Agent the violation is attributed to.
    pub fn agent_id(&self) -> &str {
        self.base().agent_id()
    }

    /// Human-readable summary.
    pub fn message(&self) -> &str {
        self.base().message()
    }

    /// Whether the caller may retry unchanged after waiting.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SecurityViolation::RateLimit { .. })
    }
}

impl From<SecurityViolation> for SecurityError {
    #[track_caller]
    fn from(violation: SecurityViolation) -> Self {
        let kind = match violation {
            SecurityViolation::Directory { path, .. } => SecurityErrorKind::PathDenied(path),
            SecurityViolation::Tool { tool_name, .. } => SecurityErrorKind::ToolDenied(tool_name),
            SecurityViolation::RateLimit {
                action,
                retry_after_ms,
                ..
            } => SecurityErrorKind::RateLimitExceeded {
                action: action.to_string(),
                retry_after_ms,
            },
            SecurityViolation::Auth { reason, .. } => {
                SecurityErrorKind::InvalidToken(reason.to_string())
            }
            SecurityViolation::Content { errors, .. } => SecurityErrorKind::ContentRejected(errors),
        };
        SecurityError::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ViolationBase {
        ViolationBase::new(1_700_000_000_000, "agent-1", "limited")
    }

    #[test]
    fn test_rate_limit_wire_shape() {
        let violation = SecurityViolation::RateLimit {
            base: base(),
            action: ActionKind::Message,
            current_count: 60,
            max_allowed: 60,
            retry_after_ms: 1_200,
        };
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["type"], "rate_limit");
        assert_eq!(json["agent_id"], "agent-1");
        assert_eq!(json["action"], "message");
        assert_eq!(json["retry_after_ms"], 1_200);

        let back: SecurityViolation = serde_json::from_value(json).unwrap();
        assert_eq!(back, violation);
    }

    #[test]
    fn test_auth_reason_reaches_error_only_coarsely() {
        let violation = SecurityViolation::Auth {
            base: base(),
            reason: AuthFailure::Revoked,
        };
        assert_eq!(violation.kind(), "auth");
        assert!(!violation.is_retryable());
        let err: SecurityError = violation.into();
        assert_eq!(err.kind, SecurityErrorKind::InvalidToken("revoked".to_string()));
    }

    #[test]
    fn test_rate_limit_converts_to_retryable_error() {
        let violation = SecurityViolation::RateLimit {
            base: base(),
            action: ActionKind::PasteCreate,
            current_count: 100,
            max_allowed: 100,
            retry_after_ms: 5,
        };
        assert!(violation.is_retryable());
        let err = SecurityError::from(violation);
        assert!(err.kind.is_retryable());
    }
}
