//! WebSocket adapter for realtime chat.
//!
//! ```text
//!   client ──ws──▶ ws_handler ──▶ ConnectionSession
//!                                   ├── reader: socket stream → handle_typing
//!                                   ├── relay:  user:<id> subscription → outbound queue
//!                                   └── writer: outbound queue → WebSocketTransport
//! ```

pub mod handler;

pub use handler::{websocket_routes, ws_handler, WebSocketState, WebSocketTransport};
