//! PostgreSQL implementation of MessageStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::chat::{ConversationKey, MessageDraft, Page, StoredMessage};
use crate::domain::foundation::{MessageId, Timestamp, UserId};
use crate::ports::{MessageStore, StoreError};

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, is_read, created_at";

/// PostgreSQL implementation of MessageStore.
#[derive(Clone)]
pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    /// Creates a new PostgresMessageStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn save(&self, draft: &MessageDraft) -> Result<StoredMessage, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO messages (sender_id, receiver_id, content)
            VALUES ($1, $2, $3)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(draft.sender_id().as_i64())
        .bind(draft.receiver_id().as_i64())
        .bind(draft.content())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to insert message: {}", e)))?;

        row_to_message(&row)
    }

    async fn conversation(
        &self,
        key: ConversationKey,
        reader: UserId,
        page: Page,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Database(format!("Failed to begin transaction: {}", e)))?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY created_at DESC, id DESC
            OFFSET $3 LIMIT $4
            "#
        ))
        .bind(key.low().as_i64())
        .bind(key.high().as_i64())
        .bind(page.skip() as i64)
        .bind(page.limit() as i64)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to fetch conversation: {}", e)))?;

        let mut messages = rows
            .iter()
            .map(row_to_message)
            .collect::<Result<Vec<_>, _>>()?;

        let unread: Vec<i64> = messages
            .iter()
            .filter(|m| m.receiver_id == reader && !m.is_read)
            .map(|m| m.id.as_i64())
            .collect();

        if !unread.is_empty() {
            sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = ANY($1)")
                .bind(&unread)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    StoreError::Database(format!("Failed to mark conversation read: {}", e))
                })?;

            for message in messages.iter_mut() {
                if message.receiver_id == reader {
                    message.is_read = true;
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Database(format!("Failed to commit transaction: {}", e)))?;

        Ok(messages)
    }

    async fn search(
        &self,
        user: UserId,
        query: &str,
        page: Page,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let pattern = format!("%{}%", escape_like(query));

        let rows = sqlx::query(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE (sender_id = $1 OR receiver_id = $1)
              AND content ILIKE $2 ESCAPE '\'
            ORDER BY created_at DESC, id DESC
            OFFSET $3 LIMIT $4
            "#
        ))
        .bind(user.as_i64())
        .bind(pattern)
        .bind(page.skip() as i64)
        .bind(page.limit() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to search messages: {}", e)))?;

        rows.iter().map(row_to_message).collect()
    }

    async fn mark_read(&self, id: MessageId, reader: UserId) -> Result<StoredMessage, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE messages SET is_read = TRUE
            WHERE id = $1 AND receiver_id = $2
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(id.as_i64())
        .bind(reader.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to mark message read: {}", e)))?;

        match row {
            Some(row) => row_to_message(&row),
            None => Err(StoreError::NotFound(format!("Message not found: {}", id))),
        }
    }

    async fn unread_count(&self, reader: UserId) -> Result<u64, StoreError> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = $1 AND is_read = FALSE",
        )
        .bind(reader.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to count unread messages: {}", e)))?;

        Ok(result.0.max(0) as u64)
    }
}

fn row_to_message(row: &PgRow) -> Result<StoredMessage, StoreError> {
    let sender_id = user_id_column(row, "sender_id")?;
    let receiver_id = user_id_column(row, "receiver_id")?;
    let created_at: DateTime<Utc> = column(row, "created_at")?;

    Ok(StoredMessage {
        id: MessageId::from_i64(column(row, "id")?),
        sender_id,
        receiver_id,
        content: column(row, "content")?,
        is_read: column(row, "is_read")?,
        created_at: Timestamp::from_datetime(created_at),
    })
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Database(format!("Failed to read column {}: {}", name, e)))
}

fn user_id_column(row: &PgRow, name: &str) -> Result<UserId, StoreError> {
    let raw: i64 = column(row, name)?;
    UserId::new(raw).map_err(|e| StoreError::Database(format!("Invalid {}: {}", name, e)))
}

/// Escapes LIKE wildcards so the query matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
