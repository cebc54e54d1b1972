//! Redis pub/sub event bus for multi-process deployments.
//!
//! Publishing goes through a shared multiplexed connection. Each
//! subscription opens its own dedicated pub/sub connection, which is
//! closed when the subscription's stream is dropped.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::chat::{ChannelName, ChatEvent};
use crate::ports::{BusError, EventBus, Subscription};

/// Redis-backed event bus.
///
/// Payloads are the JSON encoding of `ChatEvent`. Messages on the wire
/// that fail to decode are logged and skipped.
#[derive(Clone)]
pub struct RedisEventBus {
    client: redis::Client,
    conn: MultiplexedConnection,
}

impl RedisEventBus {
    /// Create a bus from a client and a publish connection.
    pub fn new(client: redis::Client, conn: MultiplexedConnection) -> Self {
        Self { client, conn }
    }

    /// Connect a publish connection from the client.
    pub async fn connect(client: redis::Client) -> Result<Self, BusError> {
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BusError::Unavailable(e.to_string()))?;
        Ok(Self::new(client, conn))
    }
}

#[async_trait]
impl EventBus for RedisEventBus {
    async fn publish(&self, channel: &ChannelName, event: &ChatEvent) -> Result<(), BusError> {
        let payload =
            serde_json::to_string(event).map_err(|e| BusError::Serialization(e.to_string()))?;

        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(channel.as_str(), payload)
            .await
            .map_err(|e: redis::RedisError| BusError::Unavailable(e.to_string()))?;

        tracing::trace!(
            channel = %channel,
            kind = event.kind(),
            receivers,
            "Published event"
        );
        Ok(())
    }

    async fn subscribe(&self, channel: &ChannelName) -> Result<Subscription, BusError> {
        // Each subscription needs a dedicated connection in subscriber mode.
        let mut pubsub = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| BusError::Unavailable(e.to_string()))?
            .into_pubsub();
        pubsub
            .subscribe(channel.as_str())
            .await
            .map_err(|e| BusError::Unavailable(e.to_string()))?;

        let name = channel.clone();
        let events = pubsub
            .into_on_message()
            .filter_map(move |msg| {
                let decoded = decode(&name, &msg);
                async move { decoded }
            })
            .boxed();

        tracing::debug!(channel = %channel, "Subscribed to channel");
        Ok(Subscription::new(channel.clone(), events))
    }
}

fn decode(channel: &ChannelName, msg: &redis::Msg) -> Option<ChatEvent> {
    let payload: String = match msg.get_payload() {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(channel = %channel, error = %e, "Non-text payload on channel");
            return None;
        }
    };
    match serde_json::from_str(&payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(channel = %channel, error = %e, "Undecodable event on channel");
            None
        }
    }
}
