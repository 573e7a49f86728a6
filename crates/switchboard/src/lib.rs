//! Security core for a multi-agent messaging switchboard.
//!
//! Re-exports the component crates behind one dependency:
//!
//! - [`RateLimiter`]: sliding-window limits per caller and action kind
//! - [`TokenManager`]: HMAC-signed bearer tokens with rotation and revocation
//! - [`ContentValidator`]: shell-injection screening and sanitization
//! - [`SecurityFacade`]: one object owning all of the above plus the path,
//!   tool, audit and policy collaborators

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use switchboard_content::ContentValidator;
pub use switchboard_core::{
    ActionKind, ActionLimitPolicy, AuditSettings, AuthFailure, Clock, ContentSettings,
    ManualClock, PathGuardSettings, RateLimitSettings, Secret, SecurityConfig,
    SecurityViolation, SystemClock, TokenSettings, ToolPolicySettings, ValidationResult,
    ViolationBase, observability,
};
pub use switchboard_error::{
    AuditError, AuditErrorKind, ConfigError, SecurityError, SecurityErrorKind, SecurityResult,
    SwitchboardError, SwitchboardResult, TokenError, TokenErrorKind,
};
pub use switchboard_rate_limit::{RateLimitDecision, RateLimiter};
#[cfg(feature = "metrics")]
pub use switchboard_security::SecurityMetrics;
pub use switchboard_security::{
    AuditLogger, AuditOutcome, AuditRecord, AuditSink, FlushReport, MemoryAuditSink, PathGuard,
    PolicyTextGenerator, SecurityFacade, ToolPolicy, TracingAuditSink,
};
pub use switchboard_token::{TokenClaims, TokenManager, peek_token_id};
