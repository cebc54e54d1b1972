//! WebSocket upgrade handler for realtime chat connections.
//!
//! Upgrades `GET /ws/:token` and hands both socket halves to a
//! `ConnectionSession`, which owns authentication, registration and
//! teardown. This module only translates between axum's `Message` and the
//! session's transport frames.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};

use crate::application::realtime::{
    ConnectionSession, InboundFrame, OutboundFrame, OutboundTransport, SessionSettings,
    TransportError,
};
use crate::application::DeliveryCoordinator;
use crate::ports::SessionValidator;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub coordinator: Arc<DeliveryCoordinator>,
    pub validator: Arc<dyn SessionValidator>,
    pub settings: SessionSettings,
}

impl WebSocketState {
    pub fn new(
        coordinator: Arc<DeliveryCoordinator>,
        validator: Arc<dyn SessionValidator>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            coordinator,
            validator,
            settings,
        }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws/:token`
///
/// The upgrade is always accepted; an invalid token is answered with a
/// policy-violation close frame so browsers can read the reason.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(token): Path<String>,
    State(state): State<WebSocketState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, token, state))
}

async fn handle_socket(socket: WebSocket, token: String, state: WebSocketState) {
    let (sender, receiver) = socket.split();
    let inbound = receiver.map(inbound_frame);
    let outbound = WebSocketTransport { sink: sender };

    let session = ConnectionSession::new(state.coordinator, state.validator, state.settings);
    let final_state = session.run(&token, inbound, outbound).await;
    tracing::trace!(state = %final_state, "WebSocket session finished");
}

fn inbound_frame(result: Result<Message, axum::Error>) -> Result<InboundFrame, TransportError> {
    match result {
        Ok(Message::Text(text)) => Ok(InboundFrame::Text(text)),
        Ok(Message::Binary(data)) => Ok(InboundFrame::Binary(data)),
        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => Ok(InboundFrame::Control),
        Ok(Message::Close(_)) => Ok(InboundFrame::Close),
        Err(e) => Err(TransportError::Io(e.to_string())),
    }
}

/// Write half of an axum WebSocket.
pub struct WebSocketTransport {
    sink: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl OutboundTransport for WebSocketTransport {
    async fn send(&mut self, frame: OutboundFrame) -> Result<(), TransportError> {
        let message = match frame {
            OutboundFrame::Event(event) => {
                let json = serde_json::to_string(&event)
                    .map_err(|e| TransportError::Io(e.to_string()))?;
                Message::Text(json)
            }
            OutboundFrame::Close(reason) => Message::Close(Some(CloseFrame {
                code: reason.code,
                reason: Cow::Owned(reason.reason),
            })),
        };

        self.sink
            .send(message)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}

/// Create axum router for the realtime endpoint.
pub fn websocket_routes(state: WebSocketState) -> Router {
    Router::new()
        .route("/ws/:token", get(ws_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_message_becomes_text_frame() {
        let frame = inbound_frame(Ok(Message::Text("{}".to_string()))).unwrap();
        assert_eq!(frame, InboundFrame::Text("{}".to_string()));
    }

    #[test]
    fn control_messages_are_not_surfaced_as_data() {
        assert_eq!(
            inbound_frame(Ok(Message::Ping(vec![1]))).unwrap(),
            InboundFrame::Control
        );
        assert_eq!(
            inbound_frame(Ok(Message::Pong(vec![]))).unwrap(),
            InboundFrame::Control
        );
    }

    #[test]
    fn close_message_becomes_close_frame() {
        assert_eq!(
            inbound_frame(Ok(Message::Close(None))).unwrap(),
            InboundFrame::Close
        );
    }

    #[test]
    fn binary_message_is_passed_through() {
        assert_eq!(
            inbound_frame(Ok(Message::Binary(vec![0xde, 0xad]))).unwrap(),
            InboundFrame::Binary(vec![0xde, 0xad])
        );
    }
}
