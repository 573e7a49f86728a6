//! Security configuration.
//!
//! One typed value, constructed once at startup and handed to the facade.
//! Every field has a documented default so an empty TOML file plus a token
//! secret is a complete configuration.

use crate::{ActionKind, ActionLimitPolicy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use switchboard_error::ConfigError;
use tracing::{debug, instrument, warn};

/// Prefix for environment overrides, e.g. `SWITCHBOARD__TOKENS__SECRET`.
pub const ENV_PREFIX: &str = "SWITCHBOARD";

const MIN_RECOMMENDED_SECRET_BYTES: usize = 32;
const REDACTED: &str = "[REDACTED]";

/// Shared HMAC key material.
///
/// `Debug`, `Display` and `Serialize` never reveal the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap key material.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw key bytes. Only the signer should call this.
    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Whether the secret is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Length of the key in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key has zero length.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret({})", REDACTED)
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(REDACTED)
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret)
    }
}

/// Sliding-window limits per action kind.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct RateLimitSettings {
    /// `message` actions per minute (default 60)
    #[serde(default = "default_messages_per_minute")]
    messages_per_minute: u32,
    /// `channel_create` actions per hour (default 10)
    #[serde(default = "default_channel_creates_per_hour")]
    channel_creates_per_hour: u32,
    /// `paste_create` actions per hour (default 100)
    #[serde(default = "default_paste_creates_per_hour")]
    paste_creates_per_hour: u32,
}

impl RateLimitSettings {
    /// Window policy for an action kind.
    pub fn policy(&self, action: ActionKind) -> ActionLimitPolicy {
        match action {
            ActionKind::Message => ActionLimitPolicy::per_minute(self.messages_per_minute),
            ActionKind::ChannelCreate => ActionLimitPolicy::per_hour(self.channel_creates_per_hour),
            ActionKind::PasteCreate => ActionLimitPolicy::per_hour(self.paste_creates_per_hour),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            messages_per_minute: default_messages_per_minute(),
            channel_creates_per_hour: default_channel_creates_per_hour(),
            paste_creates_per_hour: default_paste_creates_per_hour(),
        }
    }
}

fn default_messages_per_minute() -> u32 {
    60
}

fn default_channel_creates_per_hour() -> u32 {
    10
}

fn default_paste_creates_per_hour() -> u32 {
    100
}

/// Token lifetime, rotation and revocation retention.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct TokenSettings {
    /// HMAC-SHA256 key. Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[setters(strip_option)]
    secret: Option<Secret>,
    /// Token lifetime (default 24h)
    #[serde(default = "default_token_expiry_ms")]
    token_expiry_ms: u64,
    /// Trailing part of a token's life in which it may be refreshed (default 12h)
    #[serde(default = "default_token_rotation_interval_ms")]
    token_rotation_interval_ms: u64,
    /// How long revoked ids are remembered (default 48h)
    #[serde(default = "default_revocation_list_ttl_ms")]
    revocation_list_ttl_ms: u64,
    /// Revocation cleanup period; defaults to a quarter of the retention TTL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[setters(strip_option)]
    cleanup_interval_ms: Option<u64>,
}

impl TokenSettings {
    /// Effective revocation cleanup period.
    pub fn cleanup_interval(&self) -> Duration {
        let millis = self
            .cleanup_interval_ms
            .unwrap_or(self.revocation_list_ttl_ms / 4)
            .max(1);
        Duration::from_millis(millis)
    }

    /// A revoked id must outlive every token it could name, so the TTL may
    /// not be shorter than the token lifetime.
    pub fn check_revocation_ttl(&self) -> Result<(), ConfigError> {
        if self.revocation_list_ttl_ms == 0 {
            return Err(ConfigError::new(
                "Revocation list TTL must be greater than zero",
            ));
        }
        if self.revocation_list_ttl_ms < self.token_expiry_ms {
            return Err(ConfigError::new(format!(
                "Revocation list TTL ({} ms) is shorter than token expiry ({} ms)",
                self.revocation_list_ttl_ms, self.token_expiry_ms
            )));
        }
        Ok(())
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            secret: None,
            token_expiry_ms: default_token_expiry_ms(),
            token_rotation_interval_ms: default_token_rotation_interval_ms(),
            revocation_list_ttl_ms: default_revocation_list_ttl_ms(),
            cleanup_interval_ms: None,
        }
    }
}

fn default_token_expiry_ms() -> u64 {
    86_400_000
}

fn default_token_rotation_interval_ms() -> u64 {
    43_200_000
}

fn default_revocation_list_ttl_ms() -> u64 {
    172_800_000
}

/// Size limits for message bodies and metadata objects.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct ContentSettings {
    /// Message body cap in UTF-8 bytes (default 100 KiB)
    #[serde(default = "default_max_message_size_bytes")]
    max_message_size_bytes: usize,
    /// Maximum keys in a metadata object (default 50)
    #[serde(default = "default_max_metadata_keys")]
    max_metadata_keys: usize,
    /// Maximum characters per metadata key (default 128)
    #[serde(default = "default_max_metadata_key_length")]
    max_metadata_key_length: usize,
    /// Maximum serialized metadata size in bytes (default 10 KiB)
    #[serde(default = "default_max_metadata_size_bytes")]
    max_metadata_size_bytes: usize,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            max_message_size_bytes: default_max_message_size_bytes(),
            max_metadata_keys: default_max_metadata_keys(),
            max_metadata_key_length: default_max_metadata_key_length(),
            max_metadata_size_bytes: default_max_metadata_size_bytes(),
        }
    }
}

fn default_max_message_size_bytes() -> usize {
    102_400
}

fn default_max_metadata_keys() -> usize {
    50
}

fn default_max_metadata_key_length() -> usize {
    128
}

fn default_max_metadata_size_bytes() -> usize {
    10_240
}

/// Audit buffering.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct AuditSettings {
    /// Whether records are kept at all
    #[serde(default = "default_audit_enabled")]
    enabled: bool,
    /// Records per flush (default 100)
    #[serde(default = "default_audit_batch_size")]
    batch_size: usize,
    /// Timer-driven flush period (default 5s)
    #[serde(default = "default_audit_flush_interval_ms")]
    flush_interval_ms: u64,
    /// Buffer bound; the oldest record is dropped beyond it (default 10 000)
    #[serde(default = "default_audit_max_buffered")]
    max_buffered: usize,
}

impl AuditSettings {
    /// Flush period as a duration.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            batch_size: default_audit_batch_size(),
            flush_interval_ms: default_audit_flush_interval_ms(),
            max_buffered: default_audit_max_buffered(),
        }
    }
}

fn default_audit_enabled() -> bool {
    true
}

fn default_audit_batch_size() -> usize {
    100
}

fn default_audit_flush_interval_ms() -> u64 {
    5_000
}

fn default_audit_max_buffered() -> usize {
    10_000
}

/// Directory allowlist.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct PathGuardSettings {
    /// Roots under which access is allowed
    #[serde(default)]
    allowed_roots: Vec<PathBuf>,
    /// Roots that are always denied (takes precedence)
    #[serde(default)]
    denied_roots: Vec<PathBuf>,
}

/// Per-agent tool allowlist.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct ToolPolicySettings {
    /// Tools every agent may use; `*` allows all
    #[serde(default)]
    default_allowed: BTreeSet<String>,
    /// Tools no agent may use (takes precedence)
    #[serde(default)]
    denied: BTreeSet<String>,
    /// Agent id to the tools that agent may use
    #[serde(default)]
    agents: BTreeMap<String, BTreeSet<String>>,
}

/// Complete security configuration.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct SecurityConfig {
    /// Rate limits
    #[serde(default)]
    rate_limits: RateLimitSettings,
    /// Tokens
    #[serde(default)]
    tokens: TokenSettings,
    /// Content limits
    #[serde(default)]
    content: ContentSettings,
    /// Audit buffering
    #[serde(default)]
    audit: AuditSettings,
    /// Directory allowlist
    #[serde(default)]
    paths: PathGuardSettings,
    /// Tool allowlist
    #[serde(default)]
    tools: ToolPolicySettings,
}

impl SecurityConfig {
    /// Load from an optional TOML file, then apply `SWITCHBOARD__*` environment overrides.
    ///
    /// The result is not validated; call [`SecurityConfig::validate`] before use.
    #[instrument(skip_all, fields(path = ?path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!("Adding configuration file source");
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to load configuration: {}", e)))?;
        settings
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Render as TOML. The secret is redacted.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::new(format!("Failed to render config: {}", e)))
    }

    /// Check that the configuration can run a security core.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.tokens.secret {
            None => return Err(ConfigError::new("Token secret is not configured")),
            Some(secret) if secret.is_blank() => {
                return Err(ConfigError::new("Token secret is empty"));
            }
            Some(secret) if secret.len() < MIN_RECOMMENDED_SECRET_BYTES => {
                warn!(
                    secret_len = secret.len(),
                    recommended = MIN_RECOMMENDED_SECRET_BYTES,
                    "Token secret is shorter than recommended"
                );
            }
            Some(_) => {}
        }

        for action in ActionKind::ALL {
            if *self.rate_limits.policy(action).max_actions() == 0 {
                return Err(ConfigError::new(format!(
                    "Rate limit for {} must be greater than zero",
                    action
                )));
            }
        }

        if self.tokens.token_expiry_ms < 1_000 {
            return Err(ConfigError::new(
                "Token expiry must be at least one second",
            ));
        }
        self.tokens.check_revocation_ttl()?;
        if self.tokens.token_rotation_interval_ms > self.tokens.token_expiry_ms {
            warn!("Rotation interval exceeds token expiry; tokens are refreshable immediately");
        }

        if self.content.max_message_size_bytes == 0 {
            return Err(ConfigError::new("Maximum message size must be greater than zero"));
        }
        if self.audit.enabled && self.audit.batch_size == 0 {
            return Err(ConfigError::new("Audit batch size must be greater than zero"));
        }

        Ok(())
    }
}
