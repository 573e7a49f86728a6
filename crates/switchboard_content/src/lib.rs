//! Validation and sanitization of untrusted message content.
//!
//! [`ContentValidator::validate_content`] rejects empty, oversized, or
//! null-bearing text and anything matching a fixed list of shell-injection
//! signatures. [`ContentValidator::sanitize_content`] normalizes text for
//! storage and display. [`ContentValidator::validate_metadata`] bounds
//! metadata objects.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod patterns;
mod validator;

pub use validator::ContentValidator;
