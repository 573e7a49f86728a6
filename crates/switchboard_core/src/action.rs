//! Rate-limited action kinds and their window policies.

use serde::{Deserialize, Serialize};

/// An action a caller may perform that is subject to a sliding-window limit.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    /// Sending a message on a channel
    Message,
    /// Creating a channel
    ChannelCreate,
    /// Creating a paste
    PasteCreate,
}

impl ActionKind {
    /// Every defined action kind, in declaration order.
    pub const ALL: [ActionKind; 3] = [
        ActionKind::Message,
        ActionKind::ChannelCreate,
        ActionKind::PasteCreate,
    ];

    /// Position of this kind inside [`ActionKind::ALL`].
    pub fn index(self) -> usize {
        match self {
            ActionKind::Message => 0,
            ActionKind::ChannelCreate => 1,
            ActionKind::PasteCreate => 2,
        }
    }
}

/// Maximum number of actions allowed inside a trailing window.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_new::new,
)]
pub struct ActionLimitPolicy {
    /// Actions allowed per window
    max_actions: u32,
    /// Window length in milliseconds
    window_ms: u64,
}

impl ActionLimitPolicy {
    /// `max_actions` per minute.
    pub fn per_minute(max_actions: u32) -> Self {
        Self::new(max_actions, 60_000)
    }

    /// `max_actions` per hour.
    pub fn per_hour(max_actions: u32) -> Self {
        Self::new(max_actions, 3_600_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_wire_names() {
        assert_eq!(ActionKind::Message.to_string(), "message");
        assert_eq!(ActionKind::ChannelCreate.to_string(), "channel_create");
        assert_eq!(ActionKind::PasteCreate.as_ref(), "paste_create");
        assert_eq!(
            ActionKind::from_str("channel_create").unwrap(),
            ActionKind::ChannelCreate
        );
        assert!(ActionKind::from_str("dm").is_err());
    }

    #[test]
    fn test_index_matches_all() {
        for (i, kind) in ActionKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }
}
