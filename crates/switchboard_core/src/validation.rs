//! Outcome of a content or metadata check.

use serde::{Deserialize, Serialize};

/// Result of validating untrusted input.
///
/// Validation accumulates every violated rule instead of stopping at the
/// first, so `errors` is the full list the caller needs to fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    valid: bool,
    errors: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

impl ValidationResult {
    /// A passing result.
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// Build a result from collected errors; valid iff there are none.
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Whether the input passed every rule.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Violated rules, in the order they were checked.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Consume the result, returning the error list.
    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    /// Record a violation.
    pub fn push(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.valid = false;
    }

    /// Append another result's errors after this one's.
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.valid = self.valid && other.valid;
        self.errors.extend(other.errors);
        self
    }
}
