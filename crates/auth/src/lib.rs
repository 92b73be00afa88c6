use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use parley_config::AuthConfig;
use parley_database::{new_public_id, User};
use rand::RngCore;
use serde::Serialize;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tracing::{debug, info};

/// Upper bound on a session lifetime so expiry timestamps stay representable.
const MAX_SESSION_TTL_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

const USER_COLUMNS: &str =
    "id, public_id, username, email, created_at, updated_at, last_login_at";

#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    session_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user already exists")]
    UserExists,
    #[error("user not found")]
    UserNotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session token")]
    InvalidSession,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Self {
        let ttl_seconds = config.session_ttl_seconds.min(MAX_SESSION_TTL_SECONDS);
        let session_ttl = Duration::seconds(ttl_seconds as i64);

        Self { pool, session_ttl }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Create an account with an empty profile. Usernames are unique.
    pub async fn register_with_password(
        &self,
        username: &str,
        email: Option<&str>,
        password: &str,
    ) -> Result<User, AuthError> {
        let password_hash = hash_password(password)?;
        let email = email.filter(|value| !value.is_empty());

        // The insert is the first statement, so the transaction takes the write
        // lock up front and a concurrent duplicate fails on the unique index.
        let mut tx = self.pool.begin().await?;
        let user = insert_user(&mut tx, username, email, &password_hash).await?;

        sqlx::query(
            "INSERT INTO profiles (user_id, created_at, updated_at) VALUES (?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.created_at)
        .bind(&user.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(user = %user.public_id, username = %user.username, "registered user");
        Ok(user)
    }

    pub async fn login_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let row = sqlx::query("SELECT id, password_hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(AuthError::InvalidCredentials);
        };

        let user_id: i64 = row.try_get("id")?;
        let secret: String = row.try_get("password_hash")?;
        verify_password(password, &secret)?;

        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let session = self.issue_session(user_id).await?;
        info!(user_id, "user logged in");
        Ok(session)
    }

    pub async fn authenticate_token(&self, token: &str) -> Result<(User, AuthSession), AuthError> {
        let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(AuthError::SessionNotFound);
        };

        let user_id: i64 = row.try_get("user_id")?;
        let expires_at: String = row.try_get("expires_at")?;

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|_| AuthError::InvalidSession)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE token = ?")
                .bind(token)
                .execute(&self.pool)
                .await?;
            debug!(user_id, "removed expired session");
            return Err(AuthError::SessionExpired);
        }

        let user = self.user(user_id).await?;
        let session = AuthSession {
            token: token.to_owned(),
            user_id,
            expires_at,
        };

        Ok((user, session))
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::SessionNotFound);
        }

        Ok(())
    }

    /// Drop every session belonging to a user, returning how many were removed.
    pub async fn revoke_user_sessions(&self, user_id: i64) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Replace the password after checking the current one. All sessions except
    /// `keep_token` are revoked.
    pub async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
        keep_token: Option<&str>,
    ) -> Result<u64, AuthError> {
        let secret: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(secret) = secret else {
            return Err(AuthError::UserNotFound);
        };
        verify_password(current_password, &secret)?;

        let password_hash = hash_password(new_password)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(Utc::now().to_rfc3339())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let revoked = sqlx::query("DELETE FROM sessions WHERE user_id = ? AND token != ?")
            .bind(user_id)
            .bind(keep_token.unwrap_or_default())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        info!(user_id, revoked, "password changed");
        Ok(revoked)
    }

    pub async fn user(&self, user_id: i64) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn issue_session(&self, user_id: i64) -> Result<AuthSession, AuthError> {
        let token = generate_session_token();
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        sqlx::query(
            "INSERT INTO sessions (user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&token)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(AuthSession {
            token,
            user_id,
            expires_at,
        })
    }
}

async fn insert_user(
    tx: &mut Transaction<'_, Sqlite>,
    username: &str,
    email: Option<&str>,
    password_hash: &str,
) -> Result<User, AuthError> {
    let now = Utc::now().to_rfc3339();
    let public_id = new_public_id();

    let result = sqlx::query(
        "INSERT INTO users (public_id, username, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&public_id)
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(&now)
    .bind(&now)
    .execute(&mut **tx)
    .await
    .map_err(|error| {
        if is_username_conflict(&error) {
            AuthError::UserExists
        } else {
            AuthError::Database(error)
        }
    })?;

    Ok(User {
        id: result.last_insert_rowid(),
        public_id,
        username: username.to_owned(),
        email: email.map(str::to_owned),
        created_at: now.clone(),
        updated_at: now,
        last_login_at: None,
    })
}

fn is_username_conflict(error: &sqlx::Error) -> bool {
    error.as_database_error().is_some_and(|db| {
        db.is_unique_violation() && db.message().contains("users.username")
    })
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, secret: &str) -> Result<(), AuthError> {
    let stored_hash = PasswordHash::new(secret).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &stored_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn session_tokens_are_unique_and_urlsafe() {
        let tokens: HashSet<String> = (0..32).map(|_| generate_session_token()).collect();
        assert_eq!(tokens.len(), 32);

        for token in &tokens {
            let decoded = URL_SAFE_NO_PAD.decode(token).unwrap();
            assert_eq!(decoded.len(), 32);
            assert!(!token.contains('='));
        }
    }

    #[test]
    fn hash_password_uses_random_salt() {
        let first = hash_password("correct horse").unwrap();
        let second = hash_password("correct horse").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2"));
        verify_password("correct horse", &first).unwrap();
        verify_password("correct horse", &second).unwrap();
        assert!(matches!(
            verify_password("wrong", &first),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn malformed_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
