//! Content and metadata validation.

use crate::patterns::{ANSI_ESCAPE, BLOCKED_PATTERNS};
use serde_json::Value;
use switchboard_core::{ContentSettings, ValidationResult};
use tracing::{debug, instrument};

/// Stateless checks over untrusted message bodies and metadata.
///
/// Validation reports every violated rule at once and never echoes the
/// offending text. Sanitization is a separate, destructive cleanup.
#[derive(Debug, Clone)]
pub struct ContentValidator {
    settings: ContentSettings,
}

impl Default for ContentValidator {
    fn default() -> Self {
        Self::new(ContentSettings::default())
    }
}

impl ContentValidator {
    /// Create a validator with the given limits.
    pub fn new(settings: ContentSettings) -> Self {
        Self { settings }
    }

    /// Configured limits.
    pub fn settings(&self) -> &ContentSettings {
        &self.settings
    }

    /// Names of the shell-injection signatures, in check order.
    pub fn blocked_patterns(&self) -> impl Iterator<Item = &'static str> {
        BLOCKED_PATTERNS.iter().map(|pattern| pattern.name)
    }

    /// Validate a message body against `max_size_bytes` and every blocked signature.
    #[instrument(skip_all, fields(len = text.len(), max_size_bytes = max_size_bytes))]
    pub fn validate_content(&self, text: &str, max_size_bytes: usize) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if text.trim().is_empty() {
            result.push("Content is empty");
        }
        if text.len() > max_size_bytes {
            result.push(format!(
                "Content is {} bytes; maximum is {} bytes",
                text.len(),
                max_size_bytes
            ));
        }
        if text.contains('\0') {
            result.push("Content contains a null byte");
        }
        for pattern in BLOCKED_PATTERNS.iter() {
            if pattern.regex.is_match(text) {
                result.push(format!("Content matches blocked pattern: {}", pattern.name));
            }
        }

        if !result.is_valid() {
            debug!(errors = result.errors().len(), "Content rejected");
        }
        result
    }

    /// Validate a message body against the configured size cap.
    pub fn validate(&self, text: &str) -> ValidationResult {
        self.validate_content(text, *self.settings.max_message_size_bytes())
    }

    /// Strip null bytes, then ANSI escape sequences, then control characters
    /// other than newline, tab and carriage return. Idempotent.
    pub fn sanitize_content(&self, text: &str) -> String {
        let without_nulls = text.replace('\0', "");
        let without_ansi = ANSI_ESCAPE.replace_all(&without_nulls, "");
        without_ansi
            .chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
            .collect()
    }

    /// Validate a metadata value: an object within the key count, key length
    /// and serialized size limits.
    #[instrument(skip_all)]
    pub fn validate_metadata(&self, metadata: &Value) -> ValidationResult {
        let mut result = ValidationResult::ok();

        let Value::Object(map) = metadata else {
            result.push("Metadata must be a JSON object");
            return result;
        };

        let max_keys = *self.settings.max_metadata_keys();
        if map.len() > max_keys {
            result.push(format!(
                "Metadata has {} keys; maximum is {} keys",
                map.len(),
                max_keys
            ));
        }

        let max_key_length = *self.settings.max_metadata_key_length();
        let long_keys = map
            .keys()
            .filter(|key| key.chars().count() > max_key_length)
            .count();
        if long_keys > 0 {
            result.push(format!(
                "{} metadata key(s) exceed {} characters",
                long_keys, max_key_length
            ));
        }

        match serde_json::to_vec(metadata) {
            Ok(serialized) => {
                let max_size = *self.settings.max_metadata_size_bytes();
                if serialized.len() > max_size {
                    result.push(format!(
                        "Metadata is {} bytes serialized; maximum is {} bytes",
                        serialized.len(),
                        max_size
                    ));
                }
            }
            Err(_) => result.push("Metadata is not serializable"),
        }

        if !result.is_valid() {
            debug!(errors = result.errors().len(), "Metadata rejected");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_is_valid() {
        let validator = ContentValidator::default();
        assert!(validator.validate("Deploy finished, see build-log.txt").is_valid());
    }

    #[test]
    fn test_errors_accumulate() {
        let validator = ContentValidator::default();
        let result = validator.validate_content("\0; bash $(id)", 4);
        let errors = result.errors();
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors[0].contains("maximum is 4 bytes"));
        assert!(errors[1].contains("null byte"));
        assert!(errors[2].contains("command chaining"));
        assert!(errors[3].contains("$() command substitution"));
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        let validator = ContentValidator::default();
        let result = validator.validate(" \n\t ");
        assert_eq!(result.errors(), ["Content is empty"]);
    }

    #[test]
    fn test_errors_do_not_echo_input() {
        let validator = ContentValidator::default();
        let result = validator.validate("payload && python -c 'import os'");
        assert!(!result.is_valid());
        assert!(result.errors().iter().all(|e| !e.contains("import os")));
    }

    #[test]
    fn test_size_limit_counts_utf8_bytes() {
        let validator = ContentValidator::default();
        assert!(validator.validate_content("ééé", 6).is_valid());
        assert!(!validator.validate_content("ééé", 5).is_valid());
    }

    #[test]
    fn test_sanitize_strips_in_order() {
        let validator = ContentValidator::default();
        let dirty = "a\0b\x1b[1;31mred\x1b[0m\x07\x1b\0[2Jc\n\td\r";
        assert_eq!(validator.sanitize_content(dirty), "abredc\n\td\r");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let validator = ContentValidator::default();
        for input in ["", "plain", "\x1b\x1b[[31m", "\0\x1b[\0m", "x\u{85}y\u{7f}z"] {
            let once = validator.sanitize_content(input);
            assert_eq!(validator.sanitize_content(&once), once, "{input:?}");
            assert!(!once.contains('\0'));
            assert!(!once.contains('\x1b'));
        }
    }

    #[test]
    fn test_metadata_must_be_object() {
        let validator = ContentValidator::default();
        for value in [json!(null), json!([1, 2]), json!("s"), json!(3)] {
            let result = validator.validate_metadata(&value);
            assert_eq!(result.errors(), ["Metadata must be a JSON object"]);
        }
        assert!(validator.validate_metadata(&json!({})).is_valid());
    }

    #[test]
    fn test_metadata_key_length_and_size() {
        let validator = ContentValidator::default();
        let long_key = "k".repeat(129);
        let big_value = "v".repeat(11_000);
        let mut map = serde_json::Map::new();
        map.insert(long_key, Value::String(big_value));
        let result = validator.validate_metadata(&Value::Object(map));
        assert_eq!(result.errors().len(), 2, "{:?}", result.errors());
        assert!(result.errors()[0].contains("exceed 128 characters"));
        assert!(result.errors()[1].contains("maximum is 10240 bytes"));
    }

    #[test]
    fn test_blocked_pattern_names() {
        let validator = ContentValidator::default();
        let names: Vec<_> = validator.blocked_patterns().collect();
        assert_eq!(names.len(), 9);
        assert_eq!(names[8], "permission bypass flag");
    }
}
