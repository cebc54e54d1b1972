//! Error taxonomy for delivery operations.

use thiserror::Error;

use crate::domain::foundation::{AuthError, ValidationError};
use crate::ports::{BusError, PresenceError, StoreError};

/// Errors surfaced by the delivery coordinator and connection sessions.
///
/// Each variant names how the caller should react:
/// `Unauthenticated` rejects a connection, `NotFound` and
/// `InvalidRequest` reject one operation, `Persistence` aborts a send
/// before anything is published, `Transport` ends a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(#[from] AuthError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Presence store failure: {0}")]
    Presence(#[from] PresenceError),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Event bus failure: {0}")]
    Bus(#[from] BusError),
}

impl DeliveryError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

impl From<ValidationError> for DeliveryError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

impl From<StoreError> for DeliveryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(message) => Self::NotFound(message),
            StoreError::Database(message) => Self::Persistence(message),
        }
    }
}
