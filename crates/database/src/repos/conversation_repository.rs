//! Repository for conversations and their participants.

use crate::entities::{Conversation, Participant};
use crate::new_public_id;
use crate::types::DatabaseResult;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

const CONVERSATION_COLUMNS: &str = "c.id, c.public_id, c.title, c.created_by, c.created_at, c.updated_at";

const PARTICIPANT_SELECT: &str = "SELECT cp.conversation_id, cp.user_id, u.public_id AS user_public_id, u.username, cp.joined_at \
     FROM conversation_participants cp JOIN users u ON u.id = cp.user_id";

/// Repository for conversation database operations
#[derive(Clone)]
pub struct ConversationRepository {
    pool: SqlitePool,
}

impl ConversationRepository {
    /// Create a new conversation repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a conversation and attach its participants atomically.
    pub async fn create(
        &self,
        created_by: i64,
        title: Option<&str>,
        participant_ids: &[i64],
    ) -> DatabaseResult<Conversation> {
        let now = Utc::now().to_rfc3339();
        let public_id = new_public_id();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO conversations (public_id, title, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(title)
        .bind(created_by)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let conversation_id = result.last_insert_rowid();
        insert_participants(&mut tx, conversation_id, participant_ids, &now).await?;

        tx.commit().await?;

        info!(
            conversation = %public_id,
            created_by,
            participants = participant_ids.len(),
            "created conversation"
        );

        Ok(Conversation {
            id: conversation_id,
            public_id,
            title: title.map(str::to_string),
            created_by: Some(created_by),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c WHERE c.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c WHERE c.public_id = ?"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }

    /// Conversations the user participates in, most recently active first.
    pub async fn list_for_user(&self, user_id: i64) -> DatabaseResult<Vec<Conversation>> {
        let conversations = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c \
             JOIN conversation_participants cp ON cp.conversation_id = c.id \
             WHERE cp.user_id = ? \
             ORDER BY c.updated_at DESC, c.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(conversations)
    }

    pub async fn list_all(&self) -> DatabaseResult<Vec<Conversation>> {
        let conversations = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c ORDER BY c.id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(conversations)
    }

    /// Set or clear the title. An empty title clears it.
    pub async fn update_title(
        &self,
        conversation_id: i64,
        title: Option<&str>,
    ) -> DatabaseResult<Option<Conversation>> {
        let title = title.filter(|t| !t.is_empty());
        let result = sqlx::query("UPDATE conversations SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(Utc::now().to_rfc3339())
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(conversation_id).await
    }

    pub async fn participants(&self, conversation_id: i64) -> DatabaseResult<Vec<Participant>> {
        let participants = sqlx::query_as::<_, Participant>(&format!(
            "{PARTICIPANT_SELECT} WHERE cp.conversation_id = ? ORDER BY cp.joined_at ASC, u.id ASC"
        ))
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    pub async fn is_participant(&self, conversation_id: i64, user_id: i64) -> DatabaseResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM conversation_participants WHERE conversation_id = ? AND user_id = ?)",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Attach users to a conversation. Existing participants are left untouched.
    /// Returns how many users were newly added.
    pub async fn add_participants(
        &self,
        conversation_id: i64,
        user_ids: &[i64],
    ) -> DatabaseResult<u64> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        let added = insert_participants(&mut tx, conversation_id, user_ids, &now).await?;
        touch(&mut tx, conversation_id, &now).await?;
        tx.commit().await?;

        debug!(conversation_id, added, "added participants");
        Ok(added)
    }

    pub async fn remove_participant(&self, conversation_id: i64, user_id: i64) -> DatabaseResult<bool> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "DELETE FROM conversation_participants WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            touch(&mut tx, conversation_id, &now).await?;
        }
        tx.commit().await?;

        debug!(conversation_id, user_id, removed, "removed participant");
        Ok(removed)
    }

    /// Make the participant set exactly `user_ids`. Users that stay keep their join time.
    pub async fn replace_participants(
        &self,
        conversation_id: i64,
        user_ids: &[i64],
    ) -> DatabaseResult<()> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        if user_ids.is_empty() {
            sqlx::query("DELETE FROM conversation_participants WHERE conversation_id = ?")
                .bind(conversation_id)
                .execute(&mut *tx)
                .await?;
        } else {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "DELETE FROM conversation_participants WHERE conversation_id = ",
            );
            builder.push_bind(conversation_id);
            builder.push(" AND user_id NOT IN (");
            let mut separated = builder.separated(", ");
            for user_id in user_ids {
                separated.push_bind(*user_id);
            }
            separated.push_unseparated(")");
            builder.build().execute(&mut *tx).await?;
        }

        insert_participants(&mut tx, conversation_id, user_ids, &now).await?;
        touch(&mut tx, conversation_id, &now).await?;
        tx.commit().await?;

        debug!(conversation_id, participants = user_ids.len(), "replaced participants");
        Ok(())
    }

    pub async fn delete(&self, conversation_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn insert_participants(
    conn: &mut SqliteConnection,
    conversation_id: i64,
    user_ids: &[i64],
    joined_at: &str,
) -> DatabaseResult<u64> {
    let mut added = 0;
    for user_id in user_ids {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO conversation_participants (conversation_id, user_id, joined_at) VALUES (?, ?, ?)",
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(joined_at)
        .execute(&mut *conn)
        .await?;
        added += result.rows_affected();
    }
    Ok(added)
}

async fn touch(conn: &mut SqliteConnection, conversation_id: i64, now: &str) -> DatabaseResult<()> {
    sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(conversation_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
