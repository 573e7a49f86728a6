//! Security facade for the agent messaging switchboard.
//!
//! [`SecurityFacade`] owns a rate limiter, token manager and content
//! validator together with the smaller collaborators the messaging layer
//! consults: a directory allowlist ([`PathGuard`]), a per-agent tool
//! allowlist ([`ToolPolicy`]), a buffered audit trail ([`AuditLogger`]) and a
//! row-level security statement generator ([`PolicyTextGenerator`]).
//!
//! # Example
//!
//! ```
//! use switchboard_core::{ActionKind, SecurityConfig, Secret, TokenSettings};
//! use switchboard_security::SecurityFacade;
//!
//! let config = SecurityConfig::default().with_tokens(
//!     TokenSettings::default().with_secret(Secret::new("0123456789abcdef0123456789abcdef")),
//! );
//! let security = SecurityFacade::new(config).unwrap();
//!
//! let token = security.create_token("agent-1", "machine-A", vec![]).unwrap();
//! let claims = security.validate_token(&token).unwrap();
//!
//! let decision = security.check_rate_limit(claims.agent_id(), ActionKind::Message);
//! if decision.allowed() && security.validate_content_default("hello").is_valid() {
//!     security.record_action(claims.agent_id(), ActionKind::Message);
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod audit;
mod facade;
#[cfg(feature = "metrics")]
mod metrics;
mod path_guard;
mod policy_text;
mod tool_policy;

pub use audit::{
    AuditLogger, AuditOutcome, AuditRecord, AuditSink, FlushReport, MemoryAuditSink,
    TracingAuditSink,
};
pub use facade::SecurityFacade;
#[cfg(feature = "metrics")]
pub use metrics::SecurityMetrics;
pub use path_guard::PathGuard;
pub use policy_text::{DEFAULT_AGENT_SETTING, PolicyTextGenerator};
pub use tool_policy::{ToolPolicy, WILDCARD};
