//! In-memory presence store for tests and single-process development.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::ports::{PresenceError, PresenceStore};

/// Process-local online set.
#[derive(Debug, Default)]
pub struct InMemoryPresenceStore {
    online: RwLock<HashSet<UserId>>,
    unavailable: AtomicBool,
}

impl InMemoryPresenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the online set.
    pub fn with_online(self, users: impl IntoIterator<Item = UserId>) -> Self {
        self.online
            .write()
            .expect("InMemoryPresenceStore: lock poisoned")
            .extend(users);
        self
    }

    /// Makes every operation fail with `PresenceError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), PresenceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PresenceError::Unavailable("presence store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PresenceStore for InMemoryPresenceStore {
    async fn mark_online(&self, user_id: UserId) -> Result<(), PresenceError> {
        self.check_available()?;
        self.online
            .write()
            .expect("InMemoryPresenceStore: lock poisoned")
            .insert(user_id);
        Ok(())
    }

    async fn mark_offline(&self, user_id: UserId) -> Result<(), PresenceError> {
        self.check_available()?;
        self.online
            .write()
            .expect("InMemoryPresenceStore: lock poisoned")
            .remove(&user_id);
        Ok(())
    }

    async fn is_online(&self, user_id: UserId) -> Result<bool, PresenceError> {
        self.check_available()?;
        Ok(self
            .online
            .read()
            .expect("InMemoryPresenceStore: lock poisoned")
            .contains(&user_id))
    }

    async fn list_online(&self) -> Result<HashSet<UserId>, PresenceError> {
        self.check_available()?;
        Ok(self
            .online
            .read()
            .expect("InMemoryPresenceStore: lock poisoned")
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn mark_online_is_idempotent() {
        let store = InMemoryPresenceStore::new();

        store.mark_online(uid(1)).await.unwrap();
        store.mark_online(uid(1)).await.unwrap();

        assert_eq!(store.list_online().await.unwrap().len(), 1);
        assert!(store.is_online(uid(1)).await.unwrap());
    }

    #[tokio::test]
    async fn mark_offline_of_absent_user_is_noop() {
        let store = InMemoryPresenceStore::new().with_online([uid(2)]);

        store.mark_offline(uid(1)).await.unwrap();

        assert_eq!(store.list_online().await.unwrap(), HashSet::from([uid(2)]));
    }

    #[tokio::test]
    async fn unavailable_store_rejects_writes() {
        let store = InMemoryPresenceStore::new();
        store.set_unavailable(true);

        assert!(store.mark_online(uid(1)).await.is_err());

        store.set_unavailable(false);
        assert!(!store.is_online(uid(1)).await.unwrap());
    }
}
