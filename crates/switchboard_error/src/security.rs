//! Request-level security rejections.

/// The rejection taxonomy surfaced to the immediate caller of a guarded request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SecurityErrorKind {
    /// Caller exceeded the sliding window for an action.
    #[display("Rate limit exceeded for {action}, retry after {retry_after_ms}ms")]
    RateLimitExceeded {
        /// Action kind that was limited
        action: String,
        /// Milliseconds until capacity frees up
        retry_after_ms: u64,
    },
    /// Caller could not be authenticated. Carries only the coarse reason.
    #[display("Invalid token: {}", _0)]
    InvalidToken(String),
    /// Content failed validation. Carries every violated rule.
    #[display("Content rejected: {}", _0.join("; "))]
    ContentRejected(Vec<String>),
    /// Directory access outside the allowlist.
    #[display("Path not allowed: {}", _0)]
    PathDenied(String),
    /// Tool use outside the agent's policy.
    #[display("Tool not allowed: {}", _0)]
    ToolDenied(String),
    /// Security configuration is unusable.
    #[display("Security configuration error: {}", _0)]
    Configuration(String),
}

impl SecurityErrorKind {
    /// Whether the caller may retry the same request unchanged after waiting.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SecurityErrorKind::RateLimitExceeded { .. })
    }
}

/// Security error with location tracking.
///
/// # Examples
///
/// ```
/// use switchboard_error::{SecurityError, SecurityErrorKind};
///
/// let err = SecurityError::new(SecurityErrorKind::RateLimitExceeded {
///     action: "message".to_string(),
///     retry_after_ms: 1500,
/// });
/// assert!(err.kind.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Security Error: {} at line {} in {}", kind, line, file)]
pub struct SecurityError {
    /// The kind of error that occurred
    pub kind: SecurityErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl SecurityError {
    /// Create a new security error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SecurityErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Result type for guarded request paths.
pub type SecurityResult<T> = Result<T, SecurityError>;
