//! Signed bearer tokens for agents.
//!
//! Tokens carry the agent's identity and capabilities, are signed with
//! HMAC-SHA256 under a shared secret, expire after a configured lifetime,
//! and can be refreshed inside a trailing rotation window or revoked by id.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use switchboard_core::{Secret, SystemClock, TokenSettings};
//! use switchboard_token::TokenManager;
//!
//! let settings = TokenSettings::default().with_secret(Secret::new("0123456789abcdef0123456789abcdef"));
//! let manager = TokenManager::new(&settings, Arc::new(SystemClock)).unwrap();
//!
//! let token = manager.create_token("agent-1", "machine-A", vec!["send".to_string()]).unwrap();
//! let claims = manager.validate_token(&token).unwrap();
//! assert_eq!(claims.agent_id(), "agent-1");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod claims;
mod codec;
mod manager;
mod revocation;
mod signer;

pub use claims::TokenClaims;
pub use manager::{TokenManager, peek_token_id};
pub use revocation::RevocationSet;
