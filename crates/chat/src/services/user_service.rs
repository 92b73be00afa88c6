//! User service for managing accounts.

use parley_auth::{AuthError, Authenticator};
use parley_database::{DatabaseError, SqlitePool, UpdateUserRequest, User, UserRepository};
use tracing::info;

use crate::forms::{PasswordChangeForm, UserCreateForm, UserForm};
use crate::types::{ChatError, ChatResult};
use crate::utils::PermissionChecker;

const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Service for managing user operations
#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
    authenticator: Authenticator,
}

impl UserService {
    pub fn new(pool: SqlitePool, authenticator: Authenticator) -> Self {
        Self {
            users: UserRepository::new(pool),
            authenticator,
        }
    }

    /// Register a new account. Anonymous callers are allowed.
    pub async fn register(&self, mut form: UserCreateForm) -> ChatResult<User> {
        form.clean()?;

        let user = self
            .authenticator
            .register_with_password(&form.username, form.email.as_deref(), &form.password)
            .await
            .map_err(|error| match error {
                AuthError::UserExists => ChatError::invalid_field("username", USERNAME_TAKEN),
                other => ChatError::Auth(other),
            })?;

        Ok(user)
    }

    pub async fn get(&self, public_id: &str) -> ChatResult<User> {
        self.users
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| ChatError::not_found("user", public_id))
    }

    pub async fn update(
        &self,
        requester: &User,
        public_id: &str,
        mut form: UserForm,
    ) -> ChatResult<User> {
        let target = self.get(public_id).await?;
        PermissionChecker::can_modify_account(requester, target.id)?;
        form.clean()?;

        if let Some(username) = &form.username {
            if let Some(existing) = self.users.find_by_username(username).await? {
                if existing.id != target.id {
                    return Err(ChatError::invalid_field("username", USERNAME_TAKEN));
                }
            }
        }

        let request = UpdateUserRequest {
            username: form.username,
            email: form.email,
        };

        self.users
            .update(target.id, &request)
            .await
            .map_err(|error| match error {
                DatabaseError::Duplicate { .. } => {
                    ChatError::invalid_field("username", USERNAME_TAKEN)
                }
                other => other.into(),
            })?
            .ok_or_else(|| ChatError::not_found("user", public_id))
    }

    /// Delete an account together with its profile, sessions and messages.
    pub async fn delete(&self, requester: &User, public_id: &str) -> ChatResult<()> {
        let target = self.get(public_id).await?;
        PermissionChecker::can_modify_account(requester, target.id)?;

        if !self.users.delete(target.id).await? {
            return Err(ChatError::not_found("user", public_id));
        }

        info!(user = %target.public_id, "deleted account");
        Ok(())
    }

    /// Change the password, keeping only `current_token` signed in.
    pub async fn change_password(
        &self,
        requester: &User,
        public_id: &str,
        form: PasswordChangeForm,
        current_token: Option<&str>,
    ) -> ChatResult<u64> {
        let target = self.get(public_id).await?;
        PermissionChecker::can_modify_account(requester, target.id)?;
        form.clean()?;

        let revoked = self
            .authenticator
            .change_password(
                target.id,
                &form.current_password,
                &form.new_password,
                current_token,
            )
            .await
            .map_err(|error| match error {
                AuthError::InvalidCredentials => ChatError::invalid_field(
                    "current_password",
                    "Your old password was entered incorrectly.",
                ),
                other => ChatError::Auth(other),
            })?;

        Ok(revoked)
    }
}
