//! Profile repository for database operations.

use crate::entities::{Profile, UpdateProfileRequest};
use crate::types::{DatabaseError, DatabaseResult};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

const PROFILE_SELECT: &str = "SELECT p.user_id, u.public_id AS user_public_id, p.display_name, p.bio, p.avatar_url, p.created_at, p.updated_at \
     FROM profiles p JOIN users u ON u.id = p.user_id";

/// Repository for profile database operations
#[derive(Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

fn blank_to_none(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

impl ProfileRepository {
    /// Create a new profile repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_user_id(&self, user_id: i64) -> DatabaseResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!("{PROFILE_SELECT} WHERE p.user_id = ?"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    /// Create the profile row for a user. Each user has at most one.
    pub async fn create(
        &self,
        user_id: i64,
        request: &UpdateProfileRequest,
    ) -> DatabaseResult<Profile> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO profiles (user_id, display_name, bio, avatar_url, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(blank_to_none(&request.display_name))
        .bind(blank_to_none(&request.bio))
        .bind(blank_to_none(&request.avatar_url))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "profile", "profile already exists"))?;

        info!(user_id, "created profile");

        self.find_by_user_id(user_id)
            .await?
            .ok_or(DatabaseError::Query(sqlx::Error::RowNotFound))
    }

    /// Apply the present fields. `None` when the user has no profile.
    pub async fn update(
        &self,
        user_id: i64,
        request: &UpdateProfileRequest,
    ) -> DatabaseResult<Option<Profile>> {
        if request.is_empty() {
            return self.find_by_user_id(user_id).await;
        }

        let mut query_parts = Vec::new();
        let mut values: Vec<Option<String>> = Vec::new();

        if request.display_name.is_some() {
            query_parts.push("display_name = ?");
            values.push(blank_to_none(&request.display_name));
        }
        if request.bio.is_some() {
            query_parts.push("bio = ?");
            values.push(blank_to_none(&request.bio));
        }
        if request.avatar_url.is_some() {
            query_parts.push("avatar_url = ?");
            values.push(blank_to_none(&request.avatar_url));
        }

        query_parts.push("updated_at = ?");
        values.push(Some(Utc::now().to_rfc3339()));

        let query_str = format!(
            "UPDATE profiles SET {} WHERE user_id = ?",
            query_parts.join(", ")
        );

        let mut query = sqlx::query(&query_str);
        for value in values {
            query = query.bind(value);
        }

        let result = query.bind(user_id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_user_id(user_id).await
    }

    pub async fn delete(&self, user_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
