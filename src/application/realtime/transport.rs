//! Transport abstraction for connection sessions.
//!
//! The session never touches a socket type directly. Inbound frames arrive
//! as a stream and outbound frames go through `OutboundTransport`, so the
//! same session logic drives an axum WebSocket in production and plain
//! channels in tests.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::connection::OutboundFrame;

/// A frame received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary(Vec<u8>),
    /// Ping or pong; answered by the transport itself.
    Control,
    Close,
}

/// Failure reading from or writing to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,

    #[error("Transport I/O error: {0}")]
    Io(String),
}

/// Write half of a client transport.
#[async_trait]
pub trait OutboundTransport: Send + 'static {
    /// Write one frame. Close frames end the conversation with the client.
    async fn send(&mut self, frame: OutboundFrame) -> Result<(), TransportError>;
}

/// Outbound transport that forwards frames into a channel.
///
/// Used by tests to observe exactly what a client would receive.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    frames: mpsc::UnboundedSender<OutboundFrame>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (frames, rx) = mpsc::unbounded_channel();
        (Self { frames }, rx)
    }
}

#[async_trait]
impl OutboundTransport for ChannelTransport {
    async fn send(&mut self, frame: OutboundFrame) -> Result<(), TransportError> {
        self.frames.send(frame).map_err(|_| TransportError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::realtime::connection::CloseReason;

    #[tokio::test]
    async fn channel_transport_forwards_frames() {
        let (mut transport, mut rx) = ChannelTransport::new();

        transport
            .send(OutboundFrame::Close(CloseReason::shutdown()))
            .await
            .unwrap();

        assert_eq!(rx.recv().await, Some(OutboundFrame::Close(CloseReason::shutdown())));
    }

    #[tokio::test]
    async fn channel_transport_errors_once_receiver_is_gone() {
        let (mut transport, rx) = ChannelTransport::new();
        drop(rx);

        let result = transport
            .send(OutboundFrame::Close(CloseReason::shutdown()))
            .await;

        assert_eq!(result, Err(TransportError::Closed));
    }
}
