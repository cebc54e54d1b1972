//! PostgreSQL adapters.
//!
//! - `PostgresMessageStore` - `messages` table: history, search, read receipts
//! - `PostgresUserDirectory` - read-only lookups against `users`

mod message_store;
mod user_directory;

pub use message_store::PostgresMessageStore;
pub use user_directory::PostgresUserDirectory;
