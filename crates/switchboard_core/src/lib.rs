//! Shared types for the switchboard agent security core.
//!
//! Holds what every component agrees on: the action kinds that are rate
//! limited, the validation and violation value types, the injected clock,
//! and the single typed [`SecurityConfig`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod clock;
mod config;
pub mod observability;
mod validation;
mod violation;

pub use action::{ActionKind, ActionLimitPolicy};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    AuditSettings, ContentSettings, ENV_PREFIX, PathGuardSettings, RateLimitSettings, Secret,
    SecurityConfig, TokenSettings, ToolPolicySettings,
};
pub use validation::ValidationResult;
pub use violation::{AuthFailure, SecurityViolation, ViolationBase};
