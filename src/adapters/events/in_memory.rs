//! In-memory event bus implementation.
//!
//! Delivers events to subscribers in the same process through unbounded
//! per-subscriber queues. Used by tests and single-process development.
//!
//! # Security Note
//!
//! This adapter is for **testing and local development** only. It uses
//! `.expect()` on lock operations which will panic if locks are poisoned.
//! Multi-process deployments must use `RedisEventBus`.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tokio::sync::mpsc;

use crate::domain::chat::{ChannelName, ChatEvent};
use crate::ports::{BusError, EventBus, Subscription};

/// In-memory event bus.
///
/// Features:
/// - Per-channel FIFO delivery to every live subscriber
/// - Event capture for assertions
/// - Switchable publish failure for error-path tests
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// let mut sub = bus.subscribe(&ChannelName::user(bob)).await?;
///
/// bus.publish(&ChannelName::user(bob), &event).await?;
///
/// assert_eq!(sub.next().await, Some(event));
/// assert_eq!(bus.event_count(), 1);
/// ```
pub struct InMemoryEventBus {
    subscribers: RwLock<HashMap<ChannelName, Vec<mpsc::UnboundedSender<ChatEvent>>>>,
    published: RwLock<Vec<(ChannelName, ChatEvent)>>,
    fail_publishes: AtomicBool,
}

impl InMemoryEventBus {
    /// Creates a new empty event bus.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            published: RwLock::new(Vec::new()),
            fail_publishes: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent `publish` fail with `BusError::Unavailable`.
    pub fn with_publish_failure(self) -> Self {
        self.set_publish_failure(true);
        self
    }

    /// Toggles publish failure at runtime.
    pub fn set_publish_failure(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    // === Test Helpers ===

    /// Returns all published events with their channels.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn published_events(&self) -> Vec<(ChannelName, ChatEvent)> {
        self.published
            .read()
            .expect("InMemoryEventBus: published lock poisoned")
            .clone()
    }

    /// Returns events published to a specific channel, in publish order.
    pub fn events_on(&self, channel: &ChannelName) -> Vec<ChatEvent> {
        self.published_events()
            .into_iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, e)| e)
            .collect()
    }

    /// Returns count of published events.
    pub fn event_count(&self) -> usize {
        self.published
            .read()
            .expect("InMemoryEventBus: published lock poisoned")
            .len()
    }

    /// Clears recorded events (for test isolation).
    pub fn clear(&self) {
        self.published
            .write()
            .expect("InMemoryEventBus: published write lock poisoned")
            .clear();
    }

    /// Number of live subscribers on a channel.
    pub fn subscriber_count(&self, channel: &ChannelName) -> usize {
        self.subscribers
            .read()
            .expect("InMemoryEventBus: subscribers lock poisoned")
            .get(channel)
            .map(|senders| senders.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, channel: &ChannelName, event: &ChatEvent) -> Result<(), BusError> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(BusError::Unavailable("publish failure injected".to_string()));
        }

        self.published
            .write()
            .expect("InMemoryEventBus: published write lock poisoned")
            .push((channel.clone(), event.clone()));

        let mut subscribers = self
            .subscribers
            .write()
            .expect("InMemoryEventBus: subscribers write lock poisoned");
        if let Some(senders) = subscribers.get_mut(channel) {
            // Closed subscriptions are pruned lazily here
            senders.retain(|tx| tx.send(event.clone()).is_ok());
            if senders.is_empty() {
                subscribers.remove(channel);
            }
        }

        Ok(())
    }

    async fn subscribe(&self, channel: &ChannelName) -> Result<Subscription, BusError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .write()
            .expect("InMemoryEventBus: subscribers write lock poisoned")
            .entry(channel.clone())
            .or_default()
            .push(tx);

        let events = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
        .boxed();

        Ok(Subscription::new(channel.clone(), events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::{PresenceEvent, TypingEvent};
    use crate::domain::foundation::UserId;

    fn uid(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    fn status(user: i64, online: bool) -> ChatEvent {
        ChatEvent::Presence(PresenceEvent {
            user_id: uid(user),
            username: format!("user{}", user),
            is_online: online,
        })
    }

    #[tokio::test]
    async fn subscriber_receives_events_in_publish_order() {
        let bus = InMemoryEventBus::new();
        let channel = ChannelName::user(uid(2));
        let mut sub = bus.subscribe(&channel).await.unwrap();

        bus.publish(&channel, &status(1, true)).await.unwrap();
        bus.publish(&channel, &status(1, false)).await.unwrap();

        assert_eq!(sub.next().await, Some(status(1, true)));
        assert_eq!(sub.next().await, Some(status(1, false)));
    }

    #[tokio::test]
    async fn events_do_not_leak_across_channels() {
        let bus = InMemoryEventBus::new();
        let mut bob = bus.subscribe(&ChannelName::user(uid(2))).await.unwrap();
        let mut carol = bus.subscribe(&ChannelName::user(uid(3))).await.unwrap();

        let typing = ChatEvent::Typing(TypingEvent {
            user_id: uid(1),
            username: "alice".to_string(),
            is_typing: true,
            chat_partner_id: uid(2),
        });
        bus.publish(&ChannelName::user(uid(2)), &typing).await.unwrap();

        assert_eq!(bob.next().await, Some(typing));
        carol.close();
        assert_eq!(carol.next().await, None);
        assert_eq!(bus.events_on(&ChannelName::user(uid(3))).len(), 0);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_recorded_and_dropped() {
        let bus = InMemoryEventBus::new();
        let channel = ChannelName::user(uid(9));

        bus.publish(&channel, &status(1, true)).await.unwrap();

        assert_eq!(bus.event_count(), 1);
        assert_eq!(bus.subscriber_count(&channel), 0);
    }

    #[tokio::test]
    async fn closed_subscription_is_pruned_on_next_publish() {
        let bus = InMemoryEventBus::new();
        let channel = ChannelName::user(uid(2));
        let mut sub = bus.subscribe(&channel).await.unwrap();
        assert_eq!(bus.subscriber_count(&channel), 1);

        sub.close();
        bus.publish(&channel, &status(1, true)).await.unwrap();

        assert_eq!(bus.subscriber_count(&channel), 0);
    }

    #[tokio::test]
    async fn injected_failure_rejects_publish() {
        let bus = InMemoryEventBus::new().with_publish_failure();

        let result = bus.publish(&ChannelName::user(uid(2)), &status(1, true)).await;

        assert!(matches!(result, Err(BusError::Unavailable(_))));
        assert_eq!(bus.event_count(), 0);
    }
}
