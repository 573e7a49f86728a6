//! Token payload.

use serde::{Deserialize, Serialize};

/// Claims carried in a token's payload segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// Unique token id, used as the revocation key
    jti: String,
    /// Agent the token identifies
    agent_id: String,
    /// Machine the agent runs on
    machine_id: String,
    /// Granted capabilities, in issue order
    capabilities: Vec<String>,
    /// Issue time, seconds since the epoch
    issued_at: u64,
    /// Expiry time, seconds since the epoch
    expires_at: u64,
}

impl TokenClaims {
    pub(crate) fn new(
        jti: String,
        agent_id: String,
        machine_id: String,
        capabilities: Vec<String>,
        issued_at: u64,
        expires_at: u64,
    ) -> Self {
        Self {
            jti,
            agent_id,
            machine_id,
            capabilities,
            issued_at,
            expires_at,
        }
    }

    /// Whether the token grants a capability.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// Payload as parsed from an untrusted token, before required claims are checked.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UncheckedClaims {
    jti: Option<String>,
    agent_id: Option<String>,
    machine_id: Option<String>,
    capabilities: Option<Vec<String>>,
    issued_at: Option<u64>,
    expires_at: Option<u64>,
}

impl UncheckedClaims {
    /// Require `jti`, `agentId`, `issuedAt` and `expiresAt`.
    pub(crate) fn require(self) -> Option<TokenClaims> {
        Some(TokenClaims {
            jti: self.jti?,
            agent_id: self.agent_id?,
            issued_at: self.issued_at?,
            expires_at: self.expires_at?,
            machine_id: self.machine_id.unwrap_or_default(),
            capabilities: self.capabilities.unwrap_or_default(),
        })
    }
}
