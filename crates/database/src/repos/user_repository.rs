//! User repository for database operations.

use crate::entities::{UpdateUserRequest, User};
use crate::types::{DatabaseError, DatabaseResult};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

const USER_COLUMNS: &str =
    "id, public_id, username, email, created_at, updated_at, last_login_at";

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE public_id = ?"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Resolve a batch of public ids. Unknown ids are simply absent from the result.
    pub async fn find_by_public_ids(&self, public_ids: &[String]) -> DatabaseResult<Vec<User>> {
        if public_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE public_id IN ("
        ));
        let mut separated = builder.separated(", ");
        for public_id in public_ids {
            separated.push_bind(public_id);
        }
        separated.push_unseparated(") ORDER BY id ASC");

        let users = builder
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> DatabaseResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Update username and/or email. `None` when no such user exists.
    pub async fn update(
        &self,
        user_id: i64,
        request: &UpdateUserRequest,
    ) -> DatabaseResult<Option<User>> {
        if request.is_empty() {
            return self.find_by_id(user_id).await;
        }

        let mut query_parts = Vec::new();
        let mut values: Vec<Option<String>> = Vec::new();

        if let Some(username) = &request.username {
            query_parts.push("username = ?");
            values.push(Some(username.clone()));
        }

        if let Some(email) = &request.email {
            query_parts.push("email = ?");
            values.push(if email.is_empty() {
                None
            } else {
                Some(email.clone())
            });
        }

        query_parts.push("updated_at = ?");
        values.push(Some(Utc::now().to_rfc3339()));

        let query_str = format!("UPDATE users SET {} WHERE id = ?", query_parts.join(", "));

        let mut query = sqlx::query(&query_str);
        for value in values {
            query = query.bind(value);
        }

        let result = query
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_write(e, "user", "username already taken"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        info!(user_id, "updated user");

        self.find_by_id(user_id).await
    }

    /// Delete a user. Profile, sessions, participations and sent messages cascade.
    pub async fn delete(&self, user_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(user_id, "deleted user");
        }
        Ok(deleted)
    }

    pub async fn count(&self) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_pool, insert_user};

    #[tokio::test]
    async fn test_find_user_by_each_key() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = UserRepository::new(pool.clone());
        let alice = insert_user(&pool, "alice").await;

        let by_id = repo.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        let by_public_id = repo.find_by_public_id(&alice.public_id).await.unwrap().unwrap();
        assert_eq!(by_public_id.id, alice.id);

        let by_username = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_username.public_id, alice.public_id);

        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_public_ids_skips_unknown() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = UserRepository::new(pool.clone());
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;

        let found = repo
            .find_by_public_ids(&[
                bob.public_id.clone(),
                "missing".to_string(),
                alice.public_id.clone(),
            ])
            .await
            .unwrap();

        let names: Vec<_> = found.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert!(repo.find_by_public_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_user_fields() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = UserRepository::new(pool.clone());
        let alice = insert_user(&pool, "alice").await;

        let updated = repo
            .update(
                alice.id,
                &UpdateUserRequest {
                    username: Some("alice2".to_string()),
                    email: Some(String::new()),
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.email, None);
    }

    #[tokio::test]
    async fn test_update_rejects_taken_username() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = UserRepository::new(pool.clone());
        let alice = insert_user(&pool, "alice").await;
        insert_user(&pool, "bob").await;

        let error = repo
            .update(
                alice.id,
                &UpdateUserRequest {
                    username: Some("bob".to_string()),
                    email: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(error, DatabaseError::Duplicate { entity: "user", .. }));
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let missing = repo
            .update(
                404,
                &UpdateUserRequest {
                    username: Some("ghost".to_string()),
                    email: None,
                },
            )
            .await
            .unwrap();

        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_delete_and_count() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = UserRepository::new(pool.clone());
        let alice = insert_user(&pool, "alice").await;
        insert_user(&pool, "bob").await;

        assert_eq!(repo.count().await.unwrap(), 2);
        assert!(repo.delete(alice.id).await.unwrap());
        assert!(!repo.delete(alice.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);

        let remaining = repo.list(10, 0).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].username, "bob");
    }
}
