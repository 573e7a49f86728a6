//! Three-segment wire format: `base64url(header).base64url(payload).base64url(mac)`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Fixed header. Byte-exact for interoperability.
pub(crate) const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

pub(crate) fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub(crate) fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(segment).ok()
}

/// Borrowed segments of a token string.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TokenParts<'a> {
    pub(crate) header: &'a str,
    pub(crate) payload: &'a str,
    pub(crate) signature: &'a str,
}

impl<'a> TokenParts<'a> {
    /// Split into exactly three segments. With `require_non_empty`, every segment must have content.
    pub(crate) fn split(token: &'a str, require_non_empty: bool) -> Option<Self> {
        let mut segments = token.split('.');
        let header = segments.next()?;
        let payload = segments.next()?;
        let signature = segments.next()?;
        if segments.next().is_some() {
            return None;
        }
        if require_non_empty && (header.is_empty() || payload.is_empty() || signature.is_empty())
        {
            return None;
        }
        Some(Self {
            header,
            payload,
            signature,
        })
    }

    /// The bytes the signature covers: `header.payload`.
    pub(crate) fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }
}
