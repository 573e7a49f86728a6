//! Token error types.
//!
//! Expired, malformed and revoked tokens are ordinary validation outcomes and
//! never produce these errors. `TokenError` is reserved for failures of the
//! signing machinery itself.

/// Exceptional token failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TokenErrorKind {
    /// The MAC primitive rejected the key or failed to initialize.
    #[display("Cryptographic failure: {}", _0)]
    Crypto(String),
    /// Claims could not be serialized into the payload segment.
    #[display("Serialization failure: {}", _0)]
    Serialization(String),
}

/// Token error with location tracking.
///
/// # Examples
///
/// ```
/// use switchboard_error::{TokenError, TokenErrorKind};
///
/// let err = TokenError::new(TokenErrorKind::Crypto("invalid key length".to_string()));
/// assert!(format!("{}", err).contains("Cryptographic failure"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Token Error: {} at line {} in {}", kind, line, file)]
pub struct TokenError {
    /// The kind of error that occurred
    pub kind: TokenErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl TokenError {
    /// Create a new token error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TokenErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
