//! PresenceStore port - shared set of currently connected users.
//!
//! Presence is visible to every server process, so the backing store is
//! external (Redis in production). All operations are idempotent.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::foundation::UserId;

/// Errors from the presence backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresenceError {
    /// Backend unreachable or returned an error.
    #[error("Presence store unavailable: {0}")]
    Unavailable(String),

    /// Stored member could not be read back as a user id.
    #[error("Corrupt presence entry: {0}")]
    Corrupt(String),
}

/// Port for the shared online-users set.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// Add the user to the online set. No-op if already present.
    async fn mark_online(&self, user_id: UserId) -> Result<(), PresenceError>;

    /// Remove the user from the online set. No-op if absent.
    async fn mark_offline(&self, user_id: UserId) -> Result<(), PresenceError>;

    /// Membership test.
    async fn is_online(&self, user_id: UserId) -> Result<bool, PresenceError>;

    /// Snapshot of the whole online set, in no particular order.
    async fn list_online(&self) -> Result<HashSet<UserId>, PresenceError>;
}
