use chrono::Utc;
use parley_config::DatabaseConfig;
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::entities::User;
use crate::{new_public_id, prepare_database, run_migrations};

pub async fn create_test_pool() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("parley_test.db");
    let config = DatabaseConfig {
        url: format!("sqlite://{}", db_path.display()),
        max_connections: 2,
    };

    let pool = prepare_database(&config).await.unwrap();
    run_migrations(&pool).await.unwrap();
    (pool, temp_dir)
}

pub async fn insert_user(pool: &SqlitePool, username: &str) -> User {
    let now = Utc::now().to_rfc3339();
    let public_id = new_public_id();

    let result = sqlx::query(
        "INSERT INTO users (public_id, username, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, 'not-a-hash', ?, ?)",
    )
    .bind(&public_id)
    .bind(username)
    .bind(format!("{username}@example.com"))
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    User {
        id: result.last_insert_rowid(),
        public_id,
        username: username.to_string(),
        email: Some(format!("{username}@example.com")),
        created_at: now.clone(),
        updated_at: now,
        last_login_at: None,
    }
}
