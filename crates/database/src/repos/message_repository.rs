//! Repository for message data access operations.

use crate::entities::Message;
use crate::new_public_id;
use crate::types::{DatabaseError, DatabaseResult};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

const MESSAGE_SELECT: &str = "SELECT m.id, m.public_id, m.conversation_id, c.public_id AS conversation_public_id, \
     m.sender_id, u.public_id AS sender_public_id, u.username AS sender_username, m.text, m.created_at \
     FROM messages m \
     JOIN conversations c ON c.id = m.conversation_id \
     JOIN users u ON u.id = m.sender_id";

/// Repository for message database operations
#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a message and bump the conversation's activity timestamp.
    pub async fn create(
        &self,
        conversation_id: i64,
        sender_id: i64,
        text: &str,
    ) -> DatabaseResult<Message> {
        let now = Utc::now().to_rfc3339();
        let public_id = new_public_id();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO messages (public_id, conversation_id, sender_id, text, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(conversation_id)
        .bind(sender_id)
        .bind(text)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let message_id = result.last_insert_rowid();
        info!(message = %public_id, conversation_id, sender_id, "created message");

        self.find_by_id(message_id)
            .await?
            .ok_or(DatabaseError::Query(sqlx::Error::RowNotFound))
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(&format!("{MESSAGE_SELECT} WHERE m.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(message)
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<Message>> {
        let message =
            sqlx::query_as::<_, Message>(&format!("{MESSAGE_SELECT} WHERE m.public_id = ?"))
                .bind(public_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(message)
    }

    /// Messages in posting order.
    pub async fn list_for_conversation(
        &self,
        conversation_id: i64,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            "{MESSAGE_SELECT} WHERE m.conversation_id = ? ORDER BY m.id ASC LIMIT ? OFFSET ?"
        ))
        .bind(conversation_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    pub async fn count_for_conversation(&self, conversation_id: i64) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
            .bind(conversation_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn delete(&self, message_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
