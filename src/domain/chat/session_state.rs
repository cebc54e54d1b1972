//! Lifecycle of one realtime connection.

use crate::domain::foundation::StateMachine;

/// Connection session lifecycle.
///
/// ```text
/// Handshaking ──► Active ──► Closing ──► Closed
///      │                                   ▲
///      └───────────── rejected ────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Authenticating and registering.
    Handshaking,
    /// Both pumps running.
    Active,
    /// Pumps stopped, teardown in progress.
    Closing,
    /// Terminal.
    Closed,
}

impl StateMachine for SessionState {
    fn valid_transitions(&self) -> Vec<Self> {
        use SessionState::*;
        match self {
            Handshaking => vec![Active, Closed],
            Active => vec![Closing],
            Closing => vec![Closed],
            Closed => vec![],
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Handshaking => "handshaking",
            SessionState::Active => "active",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}
