//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the delivery subsystem and the outside world. Adapters implement these
//! ports.
//!
//! ## Realtime Ports
//!
//! - `PresenceStore` - Shared set of online users
//! - `EventBus` - Named-channel pub/sub, yielding `Subscription`s
//!
//! ## Persistence Ports
//!
//! - `MessageStore` - Direct message storage and queries
//! - `UserDirectory` - User lookup by id and username
//!
//! ## Auth Ports
//!
//! - `SessionValidator` - Token to user identity

mod event_bus;
mod message_store;
mod presence_store;
mod session_validator;
mod user_directory;

pub use event_bus::{BusError, EventBus, Subscription};
pub use message_store::{MessageStore, StoreError};
pub use presence_store::{PresenceError, PresenceStore};
pub use session_validator::SessionValidator;
pub use user_directory::UserDirectory;
