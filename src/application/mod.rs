//! Application layer - orchestration between domain types and ports.
//!
//! The realtime delivery subsystem is the only application service: it
//! owns local connections and coordinates presence, persistence and
//! pub/sub fan-out around them.

pub mod realtime;

pub use realtime::{ConnectionRegistry, ConnectionSession, DeliveryCoordinator, DeliveryError};
