//! Chat domain - messages, realtime events and channel naming.

mod channel;
mod events;
mod message;
mod session_state;

pub use channel::{ChannelName, ConversationKey};
pub use events::{
    ChatEvent, MessageEvent, OnlineRosterEvent, PresenceEvent, RosterEntry, TypingEvent,
};
pub use message::{MessageDraft, Page, StoredMessage, UserSummary};
pub use session_state::SessionState;
