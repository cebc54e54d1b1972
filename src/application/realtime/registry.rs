//! Per-process map from user id to that user's live connection.
//!
//! ```text
//! user 1 ──► Connection { id: a1f3.., outbound, close }
//! user 2 ──► Connection { id: 9c02.., outbound, close }
//! ```
//!
//! At most one connection per user. A second `register` for the same user
//! replaces the first and hands it back so the caller can close it.

use std::collections::HashMap;

use tokio::sync::{watch, RwLock};

use crate::domain::foundation::UserId;

use super::connection::Connection;

/// Concurrency-safe registry of local connections.
///
/// # Thread Safety
///
/// Uses `RwLock` since lookups (every roster push and shutdown sweep)
/// outnumber register/unregister. No I/O happens under the lock.
///
/// The connection count is published on a watch channel from inside the
/// write lock, so waiters never observe a stale size.
#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<UserId, Connection>>,
    size: watch::Sender<usize>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        let (size, _) = watch::channel(0);
        Self {
            connections: RwLock::new(HashMap::new()),
            size,
        }
    }

    /// Store `connection` for its user, returning any connection it evicted.
    pub async fn register(&self, connection: Connection) -> Option<Connection> {
        let mut connections = self.connections.write().await;
        let evicted = connections.insert(connection.user_id(), connection);
        self.size.send_replace(connections.len());

        if let Some(old) = &evicted {
            tracing::debug!(
                user_id = %old.user_id(),
                connection_id = %old.id(),
                "Registry slot replaced"
            );
        }
        evicted
    }

    /// Remove whatever connection the user currently has.
    pub async fn unregister(&self, user_id: UserId) -> Option<Connection> {
        let mut connections = self.connections.write().await;
        let removed = connections.remove(&user_id);
        self.size.send_replace(connections.len());
        removed
    }

    /// Remove `connection` only if it still occupies its user's slot.
    ///
    /// Returns false when a newer connection has taken the slot, which is
    /// left untouched.
    pub async fn unregister_connection(&self, connection: &Connection) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get(&connection.user_id()) {
            Some(current) if current.id() == connection.id() => {
                connections.remove(&connection.user_id());
                self.size.send_replace(connections.len());
                true
            }
            _ => false,
        }
    }

    pub async fn lookup(&self, user_id: UserId) -> Option<Connection> {
        self.connections.read().await.get(&user_id).cloned()
    }

    /// Visit every registered connection. `f` must not block.
    pub async fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Connection),
    {
        let connections = self.connections.read().await;
        for connection in connections.values() {
            f(connection);
        }
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Resolves once no connection is registered.
    pub async fn wait_until_empty(&self) {
        let mut size = self.size.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = size.wait_for(|n| *n == 0).await;
    }
}
