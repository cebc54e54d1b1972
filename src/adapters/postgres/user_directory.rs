//! PostgreSQL implementation of UserDirectory.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::chat::UserSummary;
use crate::domain::foundation::UserId;
use crate::ports::{StoreError, UserDirectory};

/// Reads the `users` table.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserSummary>, StoreError> {
        let row = sqlx::query("SELECT id, username FROM users WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to fetch user: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserSummary>, StoreError> {
        let row = sqlx::query("SELECT id, username FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to fetch user: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<UserSummary>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i64> = ids.iter().map(UserId::as_i64).collect();

        let rows = sqlx::query("SELECT id, username FROM users WHERE id = ANY($1) ORDER BY id")
            .bind(&raw)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to fetch users: {}", e)))?;

        rows.iter().map(row_to_user).collect()
    }

    async fn list_except(&self, id: UserId) -> Result<Vec<UserSummary>, StoreError> {
        let rows = sqlx::query("SELECT id, username FROM users WHERE id <> $1 ORDER BY id")
            .bind(id.as_i64())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to list users: {}", e)))?;

        rows.iter().map(row_to_user).collect()
    }
}

fn row_to_user(row: &PgRow) -> Result<UserSummary, StoreError> {
    let id: i64 = row
        .try_get("id")
        .map_err(|e| StoreError::Database(format!("Failed to read user id: {}", e)))?;
    let username: String = row
        .try_get("username")
        .map_err(|e| StoreError::Database(format!("Failed to read username: {}", e)))?;
    let id = UserId::new(id).map_err(|e| StoreError::Database(format!("Invalid user id: {}", e)))?;

    Ok(UserSummary::new(id, username))
}
