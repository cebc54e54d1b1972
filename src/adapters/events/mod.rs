//! Event bus adapters.
//!
//! Adapters implement the `EventBus` port for different environments:
//!
//! - `InMemoryEventBus` - In-process bus for tests and local development
//! - `RedisEventBus` - Redis pub/sub for multi-process deployments

mod in_memory;
mod redis;

pub use self::redis::RedisEventBus;
pub use in_memory::InMemoryEventBus;
