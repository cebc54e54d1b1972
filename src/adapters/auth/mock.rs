//! Token table validator for tests.
//!
//! ```ignore
//! let validator = MockSessionValidator::new()
//!     .with_test_user("alice-token", 1, "alice")
//!     .with_test_user("bob-token", 2, "bob");
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

#[derive(Debug, Default)]
struct Table {
    users: HashMap<String, AuthenticatedUser>,
    outage: Option<AuthError>,
    lookups: usize,
}

/// Resolves tokens from a fixed table; unknown tokens are `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    table: Mutex<Table>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.insert(token, user);
        self
    }

    /// Panics on a non-positive id.
    pub fn with_test_user(self, token: impl Into<String>, id: i64, username: &str) -> Self {
        let id = UserId::new(id).expect("test user ids are positive");
        self.with_user(token, AuthenticatedUser::new(id, username))
    }

    /// Fail every validation with `error` until `restore` is called.
    pub fn with_error(self, error: AuthError) -> Self {
        self.fail_with(error);
        self
    }

    pub fn insert(&self, token: impl Into<String>, user: AuthenticatedUser) {
        self.lock().users.insert(token.into(), user);
    }

    pub fn revoke(&self, token: &str) {
        self.lock().users.remove(token);
    }

    pub fn fail_with(&self, error: AuthError) {
        self.lock().outage = Some(error);
    }

    pub fn restore(&self) {
        self.lock().outage = None;
    }

    /// Number of `validate` calls so far.
    pub fn lookups(&self) -> usize {
        self.lock().lookups
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let mut table = self.lock();
        table.lookups += 1;
        if let Some(error) = &table.outage {
            return Err(error.clone());
        }
        table.users.get(token).cloned().ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_token_resolves_user() {
        let validator = MockSessionValidator::new().with_test_user("carol-token", 3, "carol");

        let user = validator.validate("carol-token").await.unwrap();

        assert_eq!(user.id.as_i64(), 3);
        assert_eq!(user.username, "carol");
        assert_eq!(validator.lookups(), 1);
    }

    #[tokio::test]
    async fn unknown_and_revoked_tokens_are_invalid() {
        let validator = MockSessionValidator::new().with_test_user("t", 3, "carol");
        validator.revoke("t");

        assert_eq!(validator.validate("t").await, Err(AuthError::InvalidToken));
        assert_eq!(validator.validate("other").await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn outage_overrides_table_until_restored() {
        let validator = MockSessionValidator::new()
            .with_test_user("t", 3, "carol")
            .with_error(AuthError::service_unavailable("directory down"));

        assert!(matches!(
            validator.validate("t").await,
            Err(AuthError::ServiceUnavailable(_))
        ));

        validator.restore();
        assert!(validator.validate("t").await.is_ok());
    }
}
