//! In-Memory Message Store Adapter
//!
//! Keeps messages in a vector. Useful for testing and development.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::chat::{ConversationKey, MessageDraft, Page, StoredMessage};
use crate::domain::foundation::{MessageId, Timestamp, UserId};
use crate::ports::{MessageStore, StoreError};

/// In-memory message storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageStore {
    messages: Arc<RwLock<Vec<StoredMessage>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryMessageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with `StoreError::Database`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored messages
    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Snapshot of all messages in insertion order
    pub async fn all(&self) -> Vec<StoredMessage> {
        self.messages.read().await.clone()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database("message store offline".to_string()));
        }
        Ok(())
    }
}

fn newest_first(messages: &mut [&mut StoredMessage]) {
    messages.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
}

fn page_range(len: usize, page: Page) -> std::ops::Range<usize> {
    let start = (page.skip() as usize).min(len);
    let end = start.saturating_add(page.limit() as usize).min(len);
    start..end
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn save(&self, draft: &MessageDraft) -> Result<StoredMessage, StoreError> {
        self.check_available()?;
        let mut messages = self.messages.write().await;
        let stored = StoredMessage {
            id: MessageId::from_i64(messages.len() as i64 + 1),
            sender_id: draft.sender_id(),
            receiver_id: draft.receiver_id(),
            content: draft.content().to_string(),
            is_read: false,
            created_at: Timestamp::now(),
        };
        messages.push(stored.clone());
        Ok(stored)
    }

    async fn conversation(
        &self,
        key: ConversationKey,
        reader: UserId,
        page: Page,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        self.check_available()?;
        let mut messages = self.messages.write().await;
        let mut matching: Vec<&mut StoredMessage> = messages
            .iter_mut()
            .filter(|m| ConversationKey::new(m.sender_id, m.receiver_id) == key)
            .collect();
        newest_first(&mut matching);

        let range = page_range(matching.len(), page);
        Ok(matching[range]
            .iter_mut()
            .map(|m| {
                if m.receiver_id == reader {
                    m.is_read = true;
                }
                m.clone()
            })
            .collect())
    }

    async fn search(
        &self,
        user: UserId,
        query: &str,
        page: Page,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        self.check_available()?;
        let needle = query.to_lowercase();
        let mut messages = self.messages.write().await;
        let mut matching: Vec<&mut StoredMessage> = messages
            .iter_mut()
            .filter(|m| m.sender_id == user || m.receiver_id == user)
            .filter(|m| m.content.to_lowercase().contains(&needle))
            .collect();
        newest_first(&mut matching);

        let range = page_range(matching.len(), page);
        Ok(matching[range].iter().map(|m| (**m).clone()).collect())
    }

    async fn mark_read(&self, id: MessageId, reader: UserId) -> Result<StoredMessage, StoreError> {
        self.check_available()?;
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == id && m.receiver_id == reader)
            .ok_or_else(|| StoreError::NotFound(format!("Message not found: {}", id)))?;
        message.is_read = true;
        Ok(message.clone())
    }

    async fn unread_count(&self, reader: UserId) -> Result<u64, StoreError> {
        self.check_available()?;
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.receiver_id == reader && !m.is_read)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    fn draft(from: i64, to: i64, content: &str) -> MessageDraft {
        MessageDraft::new(uid(from), uid(to), content).unwrap()
    }

    #[tokio::test]
    async fn save_assigns_sequential_ids_and_starts_unread() {
        let store = InMemoryMessageStore::new();

        let first = store.save(&draft(1, 2, "hi")).await.unwrap();
        let second = store.save(&draft(2, 1, "hey")).await.unwrap();

        assert_eq!(first.id, MessageId::from_i64(1));
        assert_eq!(second.id, MessageId::from_i64(2));
        assert!(!first.is_read);
    }

    #[tokio::test]
    async fn conversation_is_newest_first_and_marks_reader_messages_read() {
        let store = InMemoryMessageStore::new();
        store.save(&draft(1, 2, "one")).await.unwrap();
        store.save(&draft(2, 1, "two")).await.unwrap();
        store.save(&draft(1, 3, "elsewhere")).await.unwrap();

        let page = store
            .conversation(ConversationKey::new(uid(2), uid(1)), uid(2), Page::default())
            .await
            .unwrap();

        let contents: Vec<_> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["two", "one"]);
        assert_eq!(store.unread_count(uid(2)).await.unwrap(), 0);
        assert_eq!(store.unread_count(uid(1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn conversation_respects_skip_and_limit() {
        let store = InMemoryMessageStore::new();
        for i in 0..5 {
            store.save(&draft(1, 2, &format!("m{}", i))).await.unwrap();
        }

        let page = store
            .conversation(
                ConversationKey::new(uid(1), uid(2)),
                uid(1),
                Page::new(1, 2).unwrap(),
            )
            .await
            .unwrap();

        let contents: Vec<_> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m2"]);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_scoped_to_user() {
        let store = InMemoryMessageStore::new();
        store.save(&draft(1, 2, "Hello Bob")).await.unwrap();
        store.save(&draft(3, 4, "hello carol")).await.unwrap();

        let found = store.search(uid(2), "HELLO", Page::default()).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content, "Hello Bob");
    }

    #[tokio::test]
    async fn mark_read_only_by_receiver() {
        let store = InMemoryMessageStore::new();
        let saved = store.save(&draft(1, 2, "hi")).await.unwrap();

        let by_sender = store.mark_read(saved.id, uid(1)).await;
        assert!(matches!(by_sender, Err(StoreError::NotFound(_))));

        let by_receiver = store.mark_read(saved.id, uid(2)).await.unwrap();
        assert!(by_receiver.is_read);
    }

    #[tokio::test]
    async fn unavailable_store_fails_saves() {
        let store = InMemoryMessageStore::new();
        store.set_unavailable(true);

        let result = store.save(&draft(1, 2, "hi")).await;

        assert!(matches!(result, Err(StoreError::Database(_))));
        assert_eq!(store.message_count().await, 0);
    }
}
