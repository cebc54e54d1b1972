//! Delivery coordinator - the orchestration core of realtime delivery.
//!
//! Every event leaves this process through the event bus, addressed to a
//! per-user channel. The only exception is the online roster, which is
//! pushed straight onto the new user's local connection.
//!
//! ```text
//! send:        validate ──► receiver exists? ──► persist ──► publish user:<receiver>
//! connect:     mark online ──► publish user_status to peers ──► push roster locally
//! disconnect:  guard ──► still current? ──► mark offline ──► publish user_status
//! typing:      publish user:<partner>
//! ```
//!
//! Connect and disconnect for the same user run one at a time. Because a
//! new connection is registered before its connect runs, a disconnect that
//! finds the slot empty always finishes before the reconnect marks the
//! user online again.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::OwnedMutexGuard;

use crate::domain::chat::{
    ChannelName, ChatEvent, MessageDraft, MessageEvent, OnlineRosterEvent, PresenceEvent,
    RosterEntry, TypingEvent, UserSummary,
};
use crate::domain::foundation::{AuthenticatedUser, UserId};
use crate::ports::{EventBus, MessageStore, PresenceStore, Subscription, UserDirectory};

use super::connection::{CloseReason, Connection};
use super::errors::DeliveryError;
use super::registry::ConnectionRegistry;

/// One async mutex per user with a presence transition in flight.
#[derive(Default)]
struct PresenceLocks {
    held: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl PresenceLocks {
    async fn acquire(&self, user_id: UserId) -> PresenceGuard<'_> {
        let lock = self.table().entry(user_id).or_default().clone();
        PresenceGuard {
            locks: self,
            user_id,
            guard: Some(lock.lock_owned().await),
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<UserId, Arc<tokio::sync::Mutex<()>>>> {
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct PresenceGuard<'a> {
    locks: &'a PresenceLocks,
    user_id: UserId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PresenceGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut table = self.locks.table();
        // Only the table's own reference left: nobody holds or awaits it.
        if table
            .get(&self.user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            table.remove(&self.user_id);
        }
    }
}

/// Orchestrates persistence, presence and fan-out for realtime delivery.
pub struct DeliveryCoordinator {
    registry: Arc<ConnectionRegistry>,
    presence: Arc<dyn PresenceStore>,
    bus: Arc<dyn EventBus>,
    messages: Arc<dyn MessageStore>,
    users: Arc<dyn UserDirectory>,
    transitions: PresenceLocks,
}

impl DeliveryCoordinator {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        presence: Arc<dyn PresenceStore>,
        bus: Arc<dyn EventBus>,
        messages: Arc<dyn MessageStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            registry,
            presence,
            bus,
            messages,
            users,
            transitions: PresenceLocks::default(),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Register a new local connection, closing any connection it evicts.
    pub async fn register(&self, connection: Connection) {
        let user_id = connection.user_id();
        let connection_id = connection.id();

        if let Some(evicted) = self.registry.register(connection).await {
            tracing::info!(
                user_id = %user_id,
                evicted = %evicted.id(),
                connection_id = %connection_id,
                "Evicting previous connection"
            );
            evicted.close(CloseReason::superseded());
        }
    }

    /// Remove `connection` from the registry if it still owns its slot.
    pub async fn unregister(&self, connection: &Connection) -> bool {
        self.registry.unregister_connection(connection).await
    }

    /// Open the per-user channel subscription for a local connection.
    pub async fn subscribe(&self, user_id: UserId) -> Result<Subscription, DeliveryError> {
        Ok(self.bus.subscribe(&ChannelName::user(user_id)).await?)
    }

    /// Persist a direct message and publish it to the receiver.
    ///
    /// The returned event is the sender's acknowledgment. Nothing is
    /// published unless the message was persisted; a failed publish after
    /// that is logged and does not fail the send.
    pub async fn handle_incoming_message(
        &self,
        sender: &AuthenticatedUser,
        receiver_id: UserId,
        content: &str,
    ) -> Result<MessageEvent, DeliveryError> {
        let draft = MessageDraft::new(sender.id, receiver_id, content)?;

        let receiver = self
            .users
            .find_by_id(receiver_id)
            .await?
            .ok_or_else(|| DeliveryError::not_found(format!("Receiver {} not found", receiver_id)))?;

        let stored = self.messages.save(&draft).await.map_err(|e| {
            tracing::error!(
                sender_id = %sender.id,
                receiver_id = %receiver_id,
                error = %e,
                "Failed to persist message"
            );
            DeliveryError::from(e)
        })?;

        let sender_summary = UserSummary::new(sender.id, sender.username.clone());
        let event = stored.into_event(&sender_summary, &receiver);

        let channel = ChannelName::user(receiver_id);
        if let Err(e) = self
            .bus
            .publish(&channel, &ChatEvent::Message(event.clone()))
            .await
        {
            tracing::warn!(
                channel = %channel,
                message_id = %event.id,
                error = %e,
                "Message persisted but publish failed"
            );
        }

        tracing::debug!(
            sender_id = %sender.id,
            receiver_id = %receiver_id,
            message_id = %event.id,
            "Message delivered to bus"
        );
        Ok(event)
    }

    /// Mark the user online, announce it to peers and send them the roster.
    ///
    /// Only a failure to record presence is returned; the announcement and
    /// roster are best-effort.
    pub async fn handle_connect(&self, user_id: UserId, username: &str) -> Result<(), DeliveryError> {
        let _transition = self.transitions.acquire(user_id).await;
        self.presence.mark_online(user_id).await?;

        let peers = self.online_peer_ids(user_id).await;
        let status = ChatEvent::Presence(PresenceEvent {
            user_id,
            username: username.to_string(),
            is_online: true,
        });
        let delivered = self.fan_out(&peers, &status).await;

        tracing::info!(
            user_id = %user_id,
            peers = peers.len(),
            delivered,
            "User connected"
        );

        match self.summaries(&peers).await {
            Ok(users) => {
                let roster = OnlineRosterEvent {
                    users: users.into_iter().map(RosterEntry::from).collect(),
                };
                if let Some(connection) = self.registry.lookup(user_id).await {
                    connection.push(ChatEvent::OnlineRoster(roster));
                }
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to build online roster");
            }
        }

        Ok(())
    }

    /// Mark the connection's user offline and announce it, once.
    ///
    /// Returns false without side effects if disconnect handling already
    /// ran for this connection, or if a newer connection for the same
    /// user has taken over.
    pub async fn handle_disconnect(&self, connection: &Connection) -> bool {
        if !connection.begin_teardown() {
            tracing::debug!(
                connection_id = %connection.id(),
                "Disconnect already handled"
            );
            return false;
        }

        let user_id = connection.user_id();
        let _transition = self.transitions.acquire(user_id).await;
        if let Some(current) = self.registry.lookup(user_id).await {
            if current.id() != connection.id() {
                tracing::debug!(
                    user_id = %user_id,
                    connection_id = %connection.id(),
                    "Connection superseded, keeping user online"
                );
                return false;
            }
        }

        if let Err(e) = self.presence.mark_offline(user_id).await {
            tracing::error!(user_id = %user_id, error = %e, "Failed to mark user offline");
        }

        let peers = self.online_peer_ids(user_id).await;
        let status = ChatEvent::Presence(PresenceEvent {
            user_id,
            username: connection.username().to_string(),
            is_online: false,
        });
        let delivered = self.fan_out(&peers, &status).await;

        tracing::info!(
            user_id = %user_id,
            connection_id = %connection.id(),
            delivered,
            "User disconnected"
        );
        true
    }

    /// Forward a typing indicator to the chat partner only.
    pub async fn handle_typing(
        &self,
        sender_id: UserId,
        username: &str,
        is_typing: bool,
        chat_partner_id: UserId,
    ) -> Result<(), DeliveryError> {
        if sender_id == chat_partner_id {
            return Err(DeliveryError::invalid_request(
                "chat_partner_id cannot be the sender",
            ));
        }

        let channel = ChannelName::user(chat_partner_id);
        let event = ChatEvent::Typing(TypingEvent {
            user_id: sender_id,
            username: username.to_string(),
            is_typing,
            chat_partner_id,
        });

        if let Err(e) = self.bus.publish(&channel, &event).await {
            tracing::debug!(channel = %channel, error = %e, "Dropped typing indicator");
        }
        Ok(())
    }

    /// Online users other than `user_id`, ordered by id.
    pub async fn online_peers(&self, user_id: UserId) -> Result<Vec<UserSummary>, DeliveryError> {
        let peers = without(self.presence.list_online().await?, user_id);
        self.summaries(&peers).await
    }

    /// Every registered user except `user_id` with current presence,
    /// ordered by id.
    pub async fn directory(&self, user_id: UserId) -> Result<Vec<(UserSummary, bool)>, DeliveryError> {
        let users = self.users.list_except(user_id).await?;
        let online = self.presence.list_online().await?;
        Ok(users
            .into_iter()
            .map(|user| {
                let is_online = online.contains(&user.id);
                (user, is_online)
            })
            .collect())
    }

    /// One user with current presence, or `None` for an unknown id.
    pub async fn profile(&self, user_id: UserId) -> Result<Option<(UserSummary, bool)>, DeliveryError> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Ok(None);
        };
        let is_online = self.presence.is_online(user_id).await?;
        Ok(Some((user, is_online)))
    }

    /// Close every local connection and wait up to `grace` for their
    /// sessions to tear down.
    pub async fn shutdown(&self, grace: Duration) {
        let mut closing = 0usize;
        self.registry
            .for_each(|connection| {
                if connection.close(CloseReason::shutdown()) {
                    closing += 1;
                }
            })
            .await;
        tracing::info!(connections = closing, "Closing realtime connections");

        let drained = tokio::time::timeout(grace, self.registry.wait_until_empty()).await;

        if drained.is_err() {
            let remaining = self.registry.len().await;
            tracing::warn!(
                remaining,
                "Shutdown grace period elapsed with connections still open"
            );
        }
    }

    async fn online_peer_ids(&self, user_id: UserId) -> Vec<UserId> {
        match self.presence.list_online().await {
            Ok(online) => without(online, user_id),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to list online users");
                Vec::new()
            }
        }
    }

    async fn summaries(&self, ids: &[UserId]) -> Result<Vec<UserSummary>, DeliveryError> {
        let mut users = self.users.find_many(ids).await?;
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    /// Publish `event` to each recipient's channel concurrently. A failure
    /// for one recipient does not affect the others. Returns the number of
    /// successful publishes.
    async fn fan_out(&self, recipients: &[UserId], event: &ChatEvent) -> usize {
        let publishes = recipients.iter().map(|recipient| async move {
            let channel = ChannelName::user(*recipient);
            match self.bus.publish(&channel, event).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(
                        channel = %channel,
                        kind = event.kind(),
                        error = %e,
                        "Fan-out publish failed"
                    );
                    false
                }
            }
        });

        join_all(publishes).await.into_iter().filter(|ok| *ok).count()
    }
}

fn without(online: HashSet<UserId>, user_id: UserId) -> Vec<UserId> {
    let mut peers: Vec<UserId> = online.into_iter().filter(|id| *id != user_id).collect();
    peers.sort();
    peers
}
