//! Pub/sub channel naming.
//!
//! Channel names are derived purely from user ids so a publisher never
//! needs to know which process holds the recipient's socket.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;

/// Canonical, order-independent pair of conversation participants.
///
/// Both participants compute the same key regardless of who sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    low: UserId,
    high: UserId,
}

impl ConversationKey {
    /// Builds the key for a pair of users, smaller id first.
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// The participant with the smaller id.
    pub fn low(&self) -> UserId {
        self.low
    }

    /// The participant with the larger id.
    pub fn high(&self) -> UserId {
        self.high
    }

    /// True if `user` is one of the two participants.
    pub fn involves(&self, user: UserId) -> bool {
        self.low == user || self.high == user
    }
}

/// Name of an event bus channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName(String);

impl ChannelName {
    /// Per-user delivery channel (`user:<id>`).
    ///
    /// Every locally connected user has exactly one subscription to this.
    pub fn user(user_id: UserId) -> Self {
        Self(format!("user:{}", user_id))
    }

    /// Conversation-scoped channel (`chat:<low>:<high>`).
    pub fn conversation(key: ConversationKey) -> Self {
        Self(format!("chat:{}:{}", key.low(), key.high()))
    }

    /// Returns the channel name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
