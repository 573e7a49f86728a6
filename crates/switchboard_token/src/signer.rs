//! HMAC-SHA256 over the token's signing input.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use switchboard_core::Secret;
use switchboard_error::{TokenError, TokenErrorKind};

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies with one shared key.
#[derive(Clone)]
pub(crate) struct TokenSigner {
    key: Secret,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").field("key", &self.key).finish()
    }
}

impl TokenSigner {
    /// Build a signer, failing if the MAC rejects the key.
    pub(crate) fn new(key: Secret) -> Result<Self, TokenError> {
        let signer = Self { key };
        signer.mac()?;
        Ok(signer)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.key.expose())
            .map_err(|e| TokenError::new(TokenErrorKind::Crypto(e.to_string())))
    }

    pub(crate) fn sign(&self, input: &[u8]) -> Result<Vec<u8>, TokenError> {
        let mut mac = self.mac()?;
        mac.update(input);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Constant-time comparison of `signature` against the expected MAC.
    pub(crate) fn verify(&self, input: &[u8], signature: &[u8]) -> Result<bool, TokenError> {
        let mut mac = self.mac()?;
        mac.update(input);
        Ok(mac.verify_slice(signature).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_then_verify() {
        let signer = TokenSigner::new(Secret::new("k".repeat(32))).unwrap();
        let signature = signer.sign(b"header.payload").unwrap();
        assert_eq!(signature.len(), 32);
        assert!(signer.verify(b"header.payload", &signature).unwrap());
        assert!(!signer.verify(b"header.payload2", &signature).unwrap());
        assert!(!signer.verify(b"header.payload", &signature[..31]).unwrap());
    }

    #[test]
    fn test_different_keys_disagree() {
        let a = TokenSigner::new(Secret::new("a".repeat(32))).unwrap();
        let b = TokenSigner::new(Secret::new("b".repeat(32))).unwrap();
        let signature = a.sign(b"input").unwrap();
        assert!(!b.verify(b"input", &signature).unwrap());
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = TokenSigner::new(Secret::new("super-secret-value")).unwrap();
        assert!(!format!("{:?}", signer).contains("super-secret-value"));
    }
}
