//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the realtime core to external systems:
//! - `auth` - Access token validation (JWT, mock)
//! - `events` - Event bus implementations (in-memory, Redis pub/sub)
//! - `presence` - Online set implementations (in-memory, Redis set)
//! - `postgres` - Message store and user directory on PostgreSQL
//! - `storage` - In-memory message store and user directory
//! - `http` - REST endpoints and router
//! - `websocket` - Realtime upgrade and socket transport

pub mod auth;
pub mod events;
pub mod http;
pub mod postgres;
pub mod presence;
pub mod storage;
pub mod websocket;

pub use events::{InMemoryEventBus, RedisEventBus};
pub use presence::{InMemoryPresenceStore, RedisPresenceStore};
pub use storage::{InMemoryMessageStore, InMemoryUserDirectory};
