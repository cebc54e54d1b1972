//! Per-connection session: handshake, pumps and teardown.
//!
//! ```text
//!             ┌──────────── reader ◄── client frames
//! transport ──┤
//!             └──────────── writer ◄── outbound queue ◄── relay ◄── user:<id>
//! ```
//!
//! While Active, three tasks run: the reader dispatches client frames,
//! the relay moves bus events into the connection's outbound queue, and
//! the writer drains that queue (and the close signal) into the
//! transport. Whichever task ends first ends the session; the others are
//! aborted so a stuck socket never blocks unsubscription and a stuck
//! subscription never blocks socket teardown.

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;

use crate::domain::chat::SessionState;
use crate::domain::foundation::{AuthError, StateMachine};
use crate::ports::{SessionValidator, Subscription};

use super::client_frame::ClientFrame;
use super::connection::{CloseReason, Connection, ConnectionHandle, OutboundFrame};
use super::coordinator::DeliveryCoordinator;
use super::transport::{InboundFrame, OutboundTransport, TransportError};

/// Tunables for each session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Capacity of the per-connection outbound queue.
    pub outbound_buffer: usize,
    /// Upper bound on a single transport write.
    pub write_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            outbound_buffer: 64,
            write_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PumpExit {
    Reader,
    Writer,
    Relay,
}

/// Drives one client connection from handshake to teardown.
pub struct ConnectionSession {
    coordinator: Arc<DeliveryCoordinator>,
    validator: Arc<dyn SessionValidator>,
    settings: SessionSettings,
    state: SessionState,
}

impl ConnectionSession {
    pub fn new(
        coordinator: Arc<DeliveryCoordinator>,
        validator: Arc<dyn SessionValidator>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            coordinator,
            validator,
            settings,
            state: SessionState::Handshaking,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to completion and return its final state.
    pub async fn run<I, O>(mut self, token: &str, inbound: I, mut outbound: O) -> SessionState
    where
        I: Stream<Item = Result<InboundFrame, TransportError>> + Send + Unpin + 'static,
        O: OutboundTransport,
    {
        let (connection, handle, subscription) = match self.handshake(token).await {
            Ok(parts) => parts,
            Err(reason) => {
                let rejection = outbound.send(OutboundFrame::Close(reason.clone()));
                match tokio::time::timeout(self.settings.write_timeout, rejection).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::debug!(error = %e, "Failed to send rejection"),
                    Err(_) => tracing::debug!("Timed out sending rejection"),
                }
                tracing::info!(close = %reason, "Connection rejected");
                self.transition(SessionState::Closed);
                return self.state;
            }
        };

        self.transition(SessionState::Active);
        tracing::debug!(
            user_id = %connection.user_id(),
            connection_id = %connection.id(),
            "Session active"
        );

        let exit = self
            .pump(&connection, handle, subscription, inbound, outbound)
            .await;

        self.transition(SessionState::Closing);
        self.coordinator.unregister(&connection).await;
        self.coordinator.handle_disconnect(&connection).await;
        self.transition(SessionState::Closed);

        tracing::debug!(
            user_id = %connection.user_id(),
            connection_id = %connection.id(),
            ended_by = ?exit,
            close = ?connection.close_reason(),
            "Session closed"
        );
        self.state
    }

    async fn handshake(
        &mut self,
        token: &str,
    ) -> Result<(Connection, ConnectionHandle, Subscription), CloseReason> {
        let user = self.validator.validate(token).await.map_err(|e| match e {
            AuthError::UserNotFound => CloseReason::policy_violation("User not found"),
            AuthError::ServiceUnavailable(cause) => {
                tracing::error!(error = %cause, "Token validation unavailable");
                CloseReason::internal_error()
            }
            AuthError::InvalidToken | AuthError::TokenExpired => {
                CloseReason::policy_violation("Invalid token")
            }
        })?;

        let (connection, handle) = Connection::new(&user, self.settings.outbound_buffer);
        self.coordinator.register(connection.clone()).await;

        let subscription = match self.coordinator.subscribe(user.id).await {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Failed to subscribe user channel");
                self.abandon(&connection).await;
                return Err(CloseReason::internal_error());
            }
        };

        if let Err(e) = self.coordinator.handle_connect(user.id, &user.username).await {
            tracing::error!(user_id = %user.id, error = %e, "Failed to record presence");
            self.abandon(&connection).await;
            return Err(CloseReason::internal_error());
        }

        Ok((connection, handle, subscription))
    }

    /// Drop a half-registered connection without disconnect handling.
    async fn abandon(&self, connection: &Connection) {
        connection.begin_teardown();
        self.coordinator.unregister(connection).await;
    }

    async fn pump<I, O>(
        &self,
        connection: &Connection,
        handle: ConnectionHandle,
        subscription: Subscription,
        inbound: I,
        outbound: O,
    ) -> PumpExit
    where
        I: Stream<Item = Result<InboundFrame, TransportError>> + Send + Unpin + 'static,
        O: OutboundTransport,
    {
        let mut writer: JoinHandle<()> = tokio::spawn(write_loop(
            outbound,
            handle,
            self.settings.write_timeout,
            connection.clone(),
        ));
        let mut reader: JoinHandle<()> = tokio::spawn(read_loop(
            inbound,
            self.coordinator.clone(),
            connection.clone(),
        ));
        let mut relay: JoinHandle<()> = tokio::spawn(relay_loop(subscription, connection.clone()));

        let exit = tokio::select! {
            _ = &mut writer => PumpExit::Writer,
            _ = &mut reader => PumpExit::Reader,
            _ = &mut relay => PumpExit::Relay,
        };

        if exit == PumpExit::Relay {
            // Subscription ended under us; tell the client before leaving.
            connection.close(CloseReason::internal_error());
            reader.abort();
            let _ = tokio::time::timeout(self.settings.write_timeout, &mut writer).await;
        }

        writer.abort();
        reader.abort();
        relay.abort();
        exit
    }

    fn transition(&mut self, next: SessionState) {
        match self.state.transition_to(next) {
            Ok(state) => self.state = state,
            Err(e) => {
                tracing::warn!(from = %self.state, to = %next, error = %e, "Unexpected session transition");
                self.state = next;
            }
        }
    }
}

async fn read_loop<I>(mut inbound: I, coordinator: Arc<DeliveryCoordinator>, connection: Connection)
where
    I: Stream<Item = Result<InboundFrame, TransportError>> + Unpin,
{
    while let Some(frame) = inbound.next().await {
        match frame {
            Ok(InboundFrame::Text(text)) => dispatch(&coordinator, &connection, &text).await,
            Ok(InboundFrame::Binary(_)) => {
                tracing::debug!(connection_id = %connection.id(), "Ignoring binary frame");
            }
            Ok(InboundFrame::Control) => {}
            Ok(InboundFrame::Close) => {
                tracing::debug!(connection_id = %connection.id(), "Client sent close frame");
                return;
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection.id(), error = %e, "Receive error");
                return;
            }
        }
    }
}

async fn dispatch(coordinator: &DeliveryCoordinator, connection: &Connection, text: &str) {
    let frame = match ClientFrame::parse(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(user_id = %connection.user_id(), error = %e, "Rejected client frame");
            return;
        }
    };

    match frame {
        ClientFrame::Typing {
            chat_partner_id,
            is_typing,
        } => {
            if let Err(e) = coordinator
                .handle_typing(
                    connection.user_id(),
                    connection.username(),
                    is_typing,
                    chat_partner_id,
                )
                .await
            {
                tracing::warn!(user_id = %connection.user_id(), error = %e, "Rejected typing frame");
            }
        }
        ClientFrame::Unsupported(kind) => {
            tracing::debug!(user_id = %connection.user_id(), kind = %kind, "Ignoring client frame");
        }
    }
}

async fn relay_loop(mut subscription: Subscription, connection: Connection) {
    while let Some(event) = subscription.next().await {
        connection.push(event);
    }
    tracing::warn!(
        user_id = %connection.user_id(),
        channel = %subscription.channel(),
        "Subscription ended"
    );
    subscription.close();
}

async fn write_loop<O: OutboundTransport>(
    mut transport: O,
    mut handle: ConnectionHandle,
    write_timeout: Duration,
    connection: Connection,
) {
    loop {
        let frame = tokio::select! {
            biased;
            changed = handle.closed.changed() => {
                let reason = handle.closed.borrow_and_update().clone();
                match reason {
                    Some(reason) => OutboundFrame::Close(reason),
                    None if changed.is_err() => return,
                    None => continue,
                }
            }
            event = handle.events.recv() => match event {
                Some(event) => OutboundFrame::Event(event),
                None => return,
            },
        };

        let closing = matches!(frame, OutboundFrame::Close(_));
        match tokio::time::timeout(write_timeout, transport.send(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(connection_id = %connection.id(), error = %e, "Write failed");
                return;
            }
            Err(_) => {
                tracing::warn!(
                    user_id = %connection.user_id(),
                    connection_id = %connection.id(),
                    timeout_ms = write_timeout.as_millis() as u64,
                    "Write timed out, frame dropped"
                );
            }
        }

        if closing {
            return;
        }
    }
}
