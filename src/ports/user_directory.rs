//! UserDirectory port - read-only lookup of registered users.

use async_trait::async_trait;

use crate::domain::chat::UserSummary;
use crate::domain::foundation::UserId;

use super::StoreError;

/// Port for resolving users by id or username.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserSummary>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserSummary>, StoreError>;

    /// Resolve many ids at once. Unknown ids are skipped; order is not
    /// guaranteed.
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<UserSummary>, StoreError>;

    /// Every registered user except `id`, ordered by id.
    async fn list_except(&self, id: UserId) -> Result<Vec<UserSummary>, StoreError>;
}
