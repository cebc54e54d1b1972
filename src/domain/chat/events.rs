//! Realtime events pushed to connected clients.
//!
//! `ChatEvent` is both the wire frame written to a client socket and the
//! payload carried by the event bus, so a frame relayed from another
//! process is byte-for-byte what a local publish would have produced.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MessageId, Timestamp, UserId};

/// Tagged union of every server → client event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A direct message was stored.
    Message(MessageEvent),

    /// A user came online or went offline.
    #[serde(rename = "user_status")]
    Presence(PresenceEvent),

    /// A chat partner started or stopped typing.
    Typing(TypingEvent),

    /// Snapshot of who is online, sent once after connecting.
    #[serde(rename = "online_users")]
    OnlineRoster(OnlineRosterEvent),
}

impl ChatEvent {
    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::Message(_) => "message",
            ChatEvent::Presence(_) => "user_status",
            ChatEvent::Typing(_) => "typing",
            ChatEvent::OnlineRoster(_) => "online_users",
        }
    }
}

/// A persisted direct message, enriched with both usernames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub id: MessageId,
    pub content: String,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub sender_username: String,
    pub receiver_username: String,
    pub is_read: bool,
    pub created_at: Timestamp,
}

/// Online/offline transition for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEvent {
    pub user_id: UserId,
    pub username: String,
    pub is_online: bool,
}

/// Typing indicator addressed to a single chat partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingEvent {
    pub user_id: UserId,
    pub username: String,
    pub is_typing: bool,
    pub chat_partner_id: UserId,
}

/// One entry in the online roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: UserId,
    pub username: String,
}

/// Users currently online, excluding the recipient.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OnlineRosterEvent {
    pub users: Vec<RosterEntry>,
}
