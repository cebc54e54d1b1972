//! A live client connection as seen by the rest of the process.
//!
//! `Connection` is a cheap cloneable handle. The socket itself is owned by
//! the session's writer task; everyone else reaches it through a bounded
//! outbound queue and a one-shot close signal.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::domain::chat::ChatEvent;
use crate::domain::foundation::{AuthenticatedUser, ConnectionId, Timestamp, UserId};

/// WebSocket close codes used by the delivery subsystem.
pub mod close_code {
    /// Server is going away.
    pub const GOING_AWAY: u16 = 1001;
    /// Invalid token or unknown user.
    pub const POLICY_VIOLATION: u16 = 1008;
    /// Unexpected server-side failure.
    pub const INTERNAL_ERROR: u16 = 1011;
    /// Another connection for the same user replaced this one.
    pub const SUPERSEDED: u16 = 4000;
}

/// Close code and human-readable reason sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    pub code: u16,
    pub reason: String,
}

impl CloseReason {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    pub fn superseded() -> Self {
        Self::new(close_code::SUPERSEDED, "Superseded by a new connection")
    }

    pub fn shutdown() -> Self {
        Self::new(close_code::GOING_AWAY, "Server shutting down")
    }

    pub fn policy_violation(reason: impl Into<String>) -> Self {
        Self::new(close_code::POLICY_VIOLATION, reason)
    }

    pub fn internal_error() -> Self {
        Self::new(close_code::INTERNAL_ERROR, "Internal server error")
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason)
    }
}

/// A frame handed to the outbound transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Event(ChatEvent),
    Close(CloseReason),
}

/// Receiving ends owned by the session's writer task.
#[derive(Debug)]
pub struct ConnectionHandle {
    pub events: mpsc::Receiver<ChatEvent>,
    pub closed: watch::Receiver<Option<CloseReason>>,
}

/// Handle to one user's live transport in this process.
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    user_id: UserId,
    username: String,
    outbound: mpsc::Sender<ChatEvent>,
    close_tx: Arc<watch::Sender<Option<CloseReason>>>,
    torn_down: Arc<AtomicBool>,
    connected_at: Timestamp,
}

impl Connection {
    /// Creates a connection for `user` with an outbound queue of `buffer`
    /// events, returning the receiving half for the writer task.
    pub fn new(user: &AuthenticatedUser, buffer: usize) -> (Self, ConnectionHandle) {
        let (outbound, events) = mpsc::channel(buffer.max(1));
        let (close_tx, closed) = watch::channel(None);

        let connection = Self {
            id: ConnectionId::new(),
            user_id: user.id,
            username: user.username.clone(),
            outbound,
            close_tx: Arc::new(close_tx),
            torn_down: Arc::new(AtomicBool::new(false)),
            connected_at: Timestamp::now(),
        };
        (connection, ConnectionHandle { events, closed })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn connected_at(&self) -> Timestamp {
        self.connected_at
    }

    /// Queues an event for the client without waiting.
    ///
    /// Returns false if the event was dropped because the queue is full or
    /// the writer has already gone away.
    pub fn push(&self, event: ChatEvent) -> bool {
        match self.outbound.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(
                    user_id = %self.user_id,
                    connection_id = %self.id,
                    kind = event.kind(),
                    "Outbound queue full, dropping event"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    user_id = %self.user_id,
                    connection_id = %self.id,
                    "Outbound queue closed, dropping event"
                );
                false
            }
        }
    }

    /// Asks the writer to send a close frame and stop.
    ///
    /// Only the first reason sticks; returns false if already closing.
    pub fn close(&self, reason: CloseReason) -> bool {
        self.close_tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        })
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_tx.borrow().clone()
    }

    pub fn is_closing(&self) -> bool {
        self.close_tx.borrow().is_some()
    }

    /// Claims the right to run disconnect handling. True exactly once per
    /// connection, across all clones.
    pub fn begin_teardown(&self) -> bool {
        self.torn_down
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("connected_at", &self.connected_at)
            .finish()
    }
}
