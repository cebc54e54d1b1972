//! MessageStore port - durable storage for direct messages.

use async_trait::async_trait;

use crate::domain::chat::{ConversationKey, MessageDraft, Page, StoredMessage};
use crate::domain::foundation::{MessageId, UserId};

/// Errors from message and user persistence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Database unreachable or the query failed.
    #[error("Database error: {0}")]
    Database(String),

    /// The referenced row does not exist (or is not visible to the caller).
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Port for persisting and querying direct messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new message and return it with its assigned id and
    /// creation time. New messages are unread.
    async fn save(&self, draft: &MessageDraft) -> Result<StoredMessage, StoreError>;

    /// Messages between the two participants of `key`, newest first.
    ///
    /// Unread messages addressed to `reader` in this conversation are
    /// marked read as a side effect.
    async fn conversation(
        &self,
        key: ConversationKey,
        reader: UserId,
        page: Page,
    ) -> Result<Vec<StoredMessage>, StoreError>;

    /// Case-insensitive substring search over messages `user` sent or
    /// received, newest first.
    async fn search(
        &self,
        user: UserId,
        query: &str,
        page: Page,
    ) -> Result<Vec<StoredMessage>, StoreError>;

    /// Mark one message read. Only its receiver may do so; anything else
    /// is `NotFound`.
    async fn mark_read(&self, id: MessageId, reader: UserId) -> Result<StoredMessage, StoreError>;

    /// Number of unread messages addressed to `reader`.
    async fn unread_count(&self, reader: UserId) -> Result<u64, StoreError>;
}
