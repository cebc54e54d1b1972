//! Presence store adapters.
//!
//! - `InMemoryPresenceStore` - Process-local set for tests
//! - `RedisPresenceStore` - Shared Redis set for production

mod in_memory;
mod redis;

pub use self::redis::{RedisPresenceStore, DEFAULT_PRESENCE_KEY};
pub use in_memory::InMemoryPresenceStore;
