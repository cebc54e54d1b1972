//! In-Memory User Directory Adapter

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::chat::UserSummary;
use crate::domain::foundation::UserId;
use crate::ports::{StoreError, UserDirectory};

/// In-memory user table keyed by id
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<BTreeMap<UserId, UserSummary>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`InMemoryUserDirectory::insert`] for test setup.
    pub fn with_users(users: impl IntoIterator<Item = UserSummary>) -> Self {
        let map = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            users: Arc::new(RwLock::new(map)),
        }
    }

    /// Add or replace a user
    pub async fn insert(&self, user: UserSummary) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserSummary>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserSummary>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<UserSummary>, StoreError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn list_except(&self, id: UserId) -> Result<Vec<UserSummary>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.id != id)
            .cloned()
            .collect())
    }
}
