//! Credential validation port.
//!
//! A client presents one opaque token, either in the WebSocket path or in
//! an `Authorization: Bearer` header. This port turns it into the user the
//! connection acts for.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Resolves a raw token (no "Bearer " prefix) to a user.
///
/// Error mapping expected from implementations:
///
/// | Condition                          | Error                |
/// |------------------------------------|----------------------|
/// | bad signature, malformed claims    | `InvalidToken`       |
/// | `exp` in the past                  | `TokenExpired`       |
/// | subject not in the user directory  | `UserNotFound`       |
/// | directory or key store unreachable | `ServiceUnavailable` |
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use std::sync::Arc;

    /// Accepts exactly one token.
    struct SingleToken(&'static str, AuthenticatedUser);

    #[async_trait]
    impl SessionValidator for SingleToken {
        async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
            if token == self.0 {
                Ok(self.1.clone())
            } else {
                Err(AuthError::InvalidToken)
            }
        }
    }

    #[tokio::test]
    async fn usable_through_shared_trait_object() {
        let user = AuthenticatedUser::new(UserId::new(12).unwrap(), "carol");
        let validator: Arc<dyn SessionValidator> = Arc::new(SingleToken("abc", user.clone()));

        assert_eq!(validator.validate("abc").await, Ok(user));
        assert_eq!(validator.validate("abd").await, Err(AuthError::InvalidToken));
    }
}
