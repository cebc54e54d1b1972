//! Direct message value objects.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MessageId, Timestamp, UserId, ValidationError};

use super::channel::ConversationKey;
use super::events::{MessageEvent, RosterEntry};

/// Validated request to store a direct message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    sender_id: UserId,
    receiver_id: UserId,
    content: String,
}

impl MessageDraft {
    /// Validates a send request.
    ///
    /// Rejects self-addressed messages and blank content.
    pub fn new(
        sender_id: UserId,
        receiver_id: UserId,
        content: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if sender_id == receiver_id {
            return Err(ValidationError::invalid_format(
                "receiver_id",
                "cannot send a message to yourself",
            ));
        }
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::empty_field("content"));
        }
        Ok(Self {
            sender_id,
            receiver_id,
            content,
        })
    }

    pub fn sender_id(&self) -> UserId {
        self.sender_id
    }

    pub fn receiver_id(&self) -> UserId {
        self.receiver_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Conversation this message belongs to.
    pub fn conversation(&self) -> ConversationKey {
        ConversationKey::new(self.sender_id, self.receiver_id)
    }
}

/// A message row as returned by the message store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub is_read: bool,
    pub created_at: Timestamp,
}

impl StoredMessage {
    /// Builds the realtime event for this message.
    pub fn into_event(self, sender: &UserSummary, receiver: &UserSummary) -> MessageEvent {
        MessageEvent {
            id: self.id,
            content: self.content,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            sender_username: sender.username.clone(),
            receiver_username: receiver.username.clone(),
            is_read: self.is_read,
            created_at: self.created_at,
        }
    }
}

/// Minimal public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
}

impl UserSummary {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

impl From<UserSummary> for RosterEntry {
    fn from(user: UserSummary) -> Self {
        RosterEntry {
            id: user.id,
            username: user.username,
        }
    }
}

/// Offset pagination for history and search queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    skip: u32,
    limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 50;
    pub const MAX_LIMIT: u32 = 100;

    /// Creates a page, requiring `1 <= limit <= 100`.
    pub fn new(skip: u32, limit: u32) -> Result<Self, ValidationError> {
        if limit == 0 || limit > Self::MAX_LIMIT {
            return Err(ValidationError::out_of_range(
                "limit",
                1,
                Self::MAX_LIMIT as i64,
                limit as i64,
            ));
        }
        Ok(Self { skip, limit })
    }

    pub fn skip(&self) -> u32 {
        self.skip
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}
