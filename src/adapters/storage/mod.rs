//! In-memory storage adapters.
//!
//! Implementations of `MessageStore` and `UserDirectory` that keep
//! everything in process. Used by tests and single-process development.
//!
//! ```ignore
//! let users = InMemoryUserDirectory::with_users([alice, bob]);
//! let messages = InMemoryMessageStore::new();
//! ```

mod in_memory_message_store;
mod in_memory_user_directory;

pub use in_memory_message_store::InMemoryMessageStore;
pub use in_memory_user_directory::InMemoryUserDirectory;
