//! Realtime delivery subsystem.
//!
//! - `ConnectionRegistry` - local user id to connection map
//! - `DeliveryCoordinator` - persistence, presence and fan-out
//! - `ConnectionSession` - one client's lifetime over a transport
//!
//! Presence and pub/sub live behind the `PresenceStore` and `EventBus`
//! ports so several server processes can share them.

mod client_frame;
mod connection;
mod coordinator;
mod errors;
mod registry;
mod session;
mod transport;

pub use client_frame::ClientFrame;
pub use connection::{close_code, CloseReason, Connection, ConnectionHandle, OutboundFrame};
pub use coordinator::DeliveryCoordinator;
pub use errors::DeliveryError;
pub use registry::ConnectionRegistry;
pub use session::{ConnectionSession, SessionSettings};
pub use transport::{ChannelTransport, InboundFrame, OutboundTransport, TransportError};
