//! Issue, validate, refresh and revoke agent tokens.

use crate::claims::{TokenClaims, UncheckedClaims};
use crate::codec::{HEADER_JSON, TokenParts, decode_segment, encode_segment};
use crate::revocation::RevocationSet;
use crate::signer::TokenSigner;
use std::sync::Arc;
use switchboard_core::{AuthFailure, Clock, TokenSettings};
use switchboard_error::{ConfigError, TokenError, TokenErrorKind};
use tracing::{debug, error, info, instrument};

/// Stateless bearer tokens plus an in-memory revocation set.
///
/// A token is `base64url(header).base64url(claims).base64url(mac)` where the
/// MAC is HMAC-SHA256 over the first two segments. Validation never says why
/// a token was refused; [`TokenManager::check_token`] reports a coarse reason
/// for callers that build violations.
pub struct TokenManager {
    signer: TokenSigner,
    expiry_secs: u64,
    rotation_secs: u64,
    revocation_ttl_ms: u64,
    revoked: RevocationSet,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("expiry_secs", &self.expiry_secs)
            .field("rotation_secs", &self.rotation_secs)
            .field("revocation_ttl_ms", &self.revocation_ttl_ms)
            .field("revoked", &self.revoked.len())
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a token manager.
    ///
    /// Fails when no secret is configured or when revocations would be
    /// forgotten before the tokens they name expire.
    pub fn new(settings: &TokenSettings, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        settings.check_revocation_ttl()?;
        let secret = match settings.secret() {
            Some(secret) if !secret.is_blank() => secret.clone(),
            _ => return Err(ConfigError::new("Token secret is not configured")),
        };
        let signer = TokenSigner::new(secret)
            .map_err(|e| ConfigError::new(format!("Token secret rejected: {}", e.kind)))?;

        Ok(Self {
            signer,
            expiry_secs: *settings.token_expiry_ms() / 1000,
            rotation_secs: *settings.token_rotation_interval_ms() / 1000,
            revocation_ttl_ms: *settings.revocation_list_ttl_ms(),
            revoked: RevocationSet::new(),
            clock,
        })
    }

    /// Issue a token for an agent.
    #[instrument(skip_all, fields(agent_id = %agent_id, machine_id = %machine_id))]
    pub fn create_token(
        &self,
        agent_id: &str,
        machine_id: &str,
        capabilities: Vec<String>,
    ) -> Result<String, TokenError> {
        let issued_at = self.clock.now_secs();
        let claims = TokenClaims::new(
            uuid::Uuid::new_v4().to_string(),
            agent_id.to_string(),
            machine_id.to_string(),
            capabilities,
            issued_at,
            issued_at.saturating_add(self.expiry_secs),
        );
        let token = self.encode(&claims)?;
        debug!(jti = %claims.jti(), expires_at = claims.expires_at(), "Issued token");
        Ok(token)
    }

    fn encode(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let payload = serde_json::to_vec(claims)
            .map_err(|e| TokenError::new(TokenErrorKind::Serialization(e.to_string())))?;
        let header = encode_segment(HEADER_JSON.as_bytes());
        let payload = encode_segment(&payload);
        let signing_input = format!("{}.{}", header, payload);
        let signature = self.signer.sign(signing_input.as_bytes())?;
        Ok(format!("{}.{}", signing_input, encode_segment(&signature)))
    }

    /// Structure, signature and required claims. Expiry and revocation are checked by callers.
    fn authentic_claims(&self, token: &str) -> Option<TokenClaims> {
        let parts = TokenParts::split(token, true)?;
        let signature = decode_segment(parts.signature)?;
        match self
            .signer
            .verify(parts.signing_input().as_bytes(), &signature)
        {
            Ok(true) => {}
            Ok(false) => {
                debug!("Token signature mismatch");
                return None;
            }
            Err(e) => {
                error!(error = %e, "Token signature verification failed");
                return None;
            }
        }
        let payload = decode_segment(parts.payload)?;
        let unchecked: UncheckedClaims = serde_json::from_slice(&payload).ok()?;
        unchecked.require()
    }

    /// Validate a presented token, reporting a coarse reason on failure.
    ///
    /// Checks run in order: structure, signature, payload, required claims,
    /// expiry, revocation. A token is already expired at `expiresAt`.
    pub fn check_token(&self, token: Option<&str>) -> Result<TokenClaims, AuthFailure> {
        let token = match token {
            Some(token) if !token.trim().is_empty() => token,
            _ => return Err(AuthFailure::Missing),
        };
        let claims = self.authentic_claims(token).ok_or(AuthFailure::Invalid)?;
        if *claims.expires_at() <= self.clock.now_secs() {
            return Err(AuthFailure::Expired);
        }
        if self.revoked.is_revoked(claims.jti()) {
            return Err(AuthFailure::Revoked);
        }
        Ok(claims)
    }

    /// Claims of a currently valid token, or `None` for any failure.
    #[instrument(skip_all)]
    pub fn validate_token(&self, token: &str) -> Option<TokenClaims> {
        match self.check_token(Some(token)) {
            Ok(claims) => Some(claims),
            Err(reason) => {
                debug!(%reason, "Token rejected");
                None
            }
        }
    }

    /// Reissue a valid token once it enters its rotation window.
    ///
    /// Returns `Ok(None)` when the token is invalid or the window has not
    /// opened. The old token stays valid until it expires or is revoked.
    #[instrument(skip_all)]
    pub fn refresh_token(&self, token: &str) -> Result<Option<String>, TokenError> {
        let Some(claims) = self.validate_token(token) else {
            return Ok(None);
        };
        let window_opens = claims.expires_at().saturating_sub(self.rotation_secs);
        if self.clock.now_secs() < window_opens {
            debug!(jti = %claims.jti(), window_opens, "Too early to refresh token");
            return Ok(None);
        }
        let refreshed = self.create_token(
            claims.agent_id(),
            claims.machine_id(),
            claims.capabilities().clone(),
        )?;
        info!(agent_id = %claims.agent_id(), old_jti = %claims.jti(), "Refreshed token");
        Ok(Some(refreshed))
    }

    /// Revoke a token id. Idempotent.
    #[instrument(skip(self))]
    pub fn revoke_token(&self, jti: &str) {
        self.revoked.revoke(jti, self.clock.now_millis());
        info!("Revoked token");
    }

    /// Whether a token id is in the revocation set.
    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.is_revoked(jti)
    }

    /// Drop revocations older than the retention TTL. Returns how many were dropped.
    #[instrument(skip_all)]
    pub fn cleanup_revocation_list(&self) -> usize {
        let purged = self
            .revoked
            .purge_expired(self.clock.now_millis(), self.revocation_ttl_ms);
        if purged > 0 {
            debug!(purged, remaining = self.revoked.len(), "Purged revocation list");
        }
        purged
    }

    /// Number of remembered revocations.
    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }

    /// Read the `jti` claim without checking signature or expiry.
    ///
    /// Meant for revoking a token that may already be invalid.
    pub fn get_token_id(&self, token: &str) -> Option<String> {
        peek_token_id(token)
    }
}

/// Read the `jti` claim of a token without any key, signature or expiry check.
pub fn peek_token_id(token: &str) -> Option<String> {
    let parts = TokenParts::split(token, false)?;
    let payload = decode_segment(parts.payload)?;
    let unchecked: serde_json::Value = serde_json::from_slice(&payload).ok()?;
    unchecked.get("jti")?.as_str().map(str::to_string)
}
