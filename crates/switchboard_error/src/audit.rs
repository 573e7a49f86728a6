//! Audit sink error types.

/// Kinds of audit delivery failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum AuditErrorKind {
    /// The downstream sink refused or failed to accept a batch.
    #[display("Audit sink failure: {}", _0)]
    Sink(String),
    /// A record could not be encoded for the sink.
    #[display("Audit serialization failure: {}", _0)]
    Serialization(String),
}

/// Audit error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Audit Error: {} at line {} in {}", kind, line, file)]
pub struct AuditError {
    /// The kind of error that occurred
    pub kind: AuditErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl AuditError {
    /// Create a new audit error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AuditErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
