//! Redis-backed presence store.
//!
//! Presence is a single Redis set whose members are decimal user ids:
//! SADD on connect, SREM on disconnect, SISMEMBER and SMEMBERS for reads.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::collections::HashSet;

use crate::domain::foundation::UserId;
use crate::ports::{PresenceError, PresenceStore};

/// Default key of the online set.
pub const DEFAULT_PRESENCE_KEY: &str = "online_users";

/// Presence store shared by every server process.
#[derive(Clone)]
pub struct RedisPresenceStore {
    conn: MultiplexedConnection,
    key: String,
}

impl RedisPresenceStore {
    /// Create a store using the default `online_users` key.
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self::with_key(conn, DEFAULT_PRESENCE_KEY)
    }

    /// Create a store on a custom set key.
    pub fn with_key(conn: MultiplexedConnection, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }
}

fn unavailable(e: redis::RedisError) -> PresenceError {
    PresenceError::Unavailable(e.to_string())
}

#[async_trait]
impl PresenceStore for RedisPresenceStore {
    async fn mark_online(&self, user_id: UserId) -> Result<(), PresenceError> {
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(&self.key, user_id.as_i64())
            .await
            .map_err(unavailable)
    }

    async fn mark_offline(&self, user_id: UserId) -> Result<(), PresenceError> {
        let mut conn = self.conn.clone();
        conn.srem::<_, _, ()>(&self.key, user_id.as_i64())
            .await
            .map_err(unavailable)
    }

    async fn is_online(&self, user_id: UserId) -> Result<bool, PresenceError> {
        let mut conn = self.conn.clone();
        conn.sismember(&self.key, user_id.as_i64())
            .await
            .map_err(unavailable)
    }

    async fn list_online(&self) -> Result<HashSet<UserId>, PresenceError> {
        let mut conn = self.conn.clone();
        let members: Vec<i64> = conn.smembers(&self.key).await.map_err(unavailable)?;

        members
            .into_iter()
            .map(|raw| UserId::new(raw).map_err(|e| PresenceError::Corrupt(e.to_string())))
            .collect()
    }
}
