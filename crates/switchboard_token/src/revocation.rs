//! Revoked token ids, remembered for a bounded time.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Token ids mapped to the millisecond they were revoked.
#[derive(Debug, Default)]
pub struct RevocationSet {
    entries: Mutex<HashMap<String, u64>>,
}

impl RevocationSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark an id revoked. Revoking again refreshes the timestamp.
    pub fn revoke(&self, jti: &str, now_ms: u64) {
        self.entries().insert(jti.to_string(), now_ms);
    }

    /// Whether an id is currently remembered as revoked.
    pub fn is_revoked(&self, jti: &str) -> bool {
        self.entries().contains_key(jti)
    }

    /// Forget ids revoked more than `ttl_ms` ago. Returns how many were dropped.
    pub fn purge_expired(&self, now_ms: u64, ttl_ms: u64) -> usize {
        let cutoff = now_ms.saturating_sub(ttl_ms);
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, revoked_at| *revoked_at >= cutoff);
        before - entries.len()
    }

    /// Number of remembered ids.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether nothing is revoked.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
