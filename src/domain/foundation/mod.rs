//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, authentication types and the error
//! vocabulary shared by every layer.

mod auth;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ConnectionId, MessageId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
