//! Sliding-window rate limiting for the switchboard security core.
//!
//! Each (caller, action kind) pair keeps an ordered list of recent action
//! timestamps. Entries older than the action's window are pruned before
//! every read, and the caller is allowed while the pruned count is below
//! the configured maximum.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod limiter;
mod window;

pub use limiter::{RateLimitDecision, RateLimiter};
