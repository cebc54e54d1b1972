//! Identity produced by token validation.

use thiserror::Error;

use super::UserId;

/// The user a connection or request acts for.
///
/// `username` travels with the id so presence and typing events can be
/// built without another directory lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub username: String,
}

impl AuthenticatedUser {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// Why a token could not be turned into a user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// True when the client must present a different token; false for
    /// outages where retrying the same token may succeed.
    pub fn is_credential_failure(&self) -> bool {
        !matches!(self, AuthError::ServiceUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_outages_are_retryable() {
        assert!(AuthError::InvalidToken.is_credential_failure());
        assert!(AuthError::TokenExpired.is_credential_failure());
        assert!(AuthError::UserNotFound.is_credential_failure());
        assert!(!AuthError::service_unavailable("down").is_credential_failure());
    }
}
