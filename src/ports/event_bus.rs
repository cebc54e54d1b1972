//! EventBus port - named-channel publish/subscribe for realtime events.
//!
//! Publishers address users by channel name only. Whichever process holds
//! the recipient's connection has a subscription on that channel and
//! relays the event to the socket.
//!
//! Delivery is at-most-once: events published while nobody is subscribed
//! are lost. Within one channel, events arrive in publish order.

use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::domain::chat::{ChannelName, ChatEvent};

/// Errors from the pub/sub backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// Backend unreachable or the command failed.
    #[error("Event bus unavailable: {0}")]
    Unavailable(String),

    /// Event could not be encoded for the wire.
    #[error("Event serialization failed: {0}")]
    Serialization(String),
}

/// Port for publishing and subscribing to realtime events.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event to every current subscriber of `channel`.
    async fn publish(&self, channel: &ChannelName, event: &ChatEvent) -> Result<(), BusError>;

    /// Open a subscription on `channel`.
    ///
    /// The returned subscription only sees events published after this
    /// call resolves.
    async fn subscribe(&self, channel: &ChannelName) -> Result<Subscription, BusError>;
}

/// A live subscription to one channel.
///
/// Events are pulled lazily with [`Subscription::next`]. Closing releases
/// the underlying backend resources; dropping the value closes it too.
pub struct Subscription {
    channel: ChannelName,
    events: Option<BoxStream<'static, ChatEvent>>,
}

impl Subscription {
    /// Wraps an adapter-specific event stream.
    pub fn new(channel: ChannelName, events: BoxStream<'static, ChatEvent>) -> Self {
        Self {
            channel,
            events: Some(events),
        }
    }

    /// Channel this subscription listens on.
    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }

    /// Next event, or `None` once the subscription is closed or the
    /// backend stream ends.
    pub async fn next(&mut self) -> Option<ChatEvent> {
        match self.events.as_mut() {
            Some(events) => events.next().await,
            None => None,
        }
    }

    /// Release the subscription. Safe to call more than once.
    pub fn close(&mut self) {
        if self.events.take().is_some() {
            tracing::debug!(channel = %self.channel, "Subscription closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.events.is_none()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("closed", &self.is_closed())
            .finish()
    }
}
