//! Domain layer - pure types with no I/O.
//!
//! - `foundation` - identifiers, timestamps, errors, auth types
//! - `chat` - messages, realtime events, channels, session lifecycle

pub mod chat;
pub mod foundation;
