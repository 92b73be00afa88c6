//! Profile service.

use parley_database::{
    Profile, ProfileRepository, SqlitePool, UpdateProfileRequest, User, UserRepository,
};

use crate::forms::ProfileForm;
use crate::types::{ChatError, ChatResult};
use crate::utils::PermissionChecker;

/// Service for managing user profiles
#[derive(Clone)]
pub struct ProfileService {
    users: UserRepository,
    profiles: ProfileRepository,
}

impl From<ProfileForm> for UpdateProfileRequest {
    fn from(form: ProfileForm) -> Self {
        Self {
            display_name: form.display_name,
            bio: form.bio,
            avatar_url: form.avatar_url,
        }
    }
}

impl ProfileService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            profiles: ProfileRepository::new(pool),
        }
    }

    async fn owner(&self, user_public_id: &str) -> ChatResult<User> {
        self.users
            .find_by_public_id(user_public_id)
            .await?
            .ok_or_else(|| ChatError::not_found("user", user_public_id))
    }

    pub async fn get(&self, user_public_id: &str) -> ChatResult<Profile> {
        let owner = self.owner(user_public_id).await?;
        self.profiles
            .find_by_user_id(owner.id)
            .await?
            .ok_or_else(|| ChatError::not_found("profile", user_public_id))
    }

    /// Create the requester's own profile. Fails if one already exists.
    pub async fn create(&self, requester: &User, mut form: ProfileForm) -> ChatResult<Profile> {
        form.clean()?;

        if self.profiles.find_by_user_id(requester.id).await?.is_some() {
            return Err(ChatError::conflict("profile already exists"));
        }

        let profile = self.profiles.create(requester.id, &form.into()).await?;
        Ok(profile)
    }

    pub async fn update(
        &self,
        requester: &User,
        user_public_id: &str,
        mut form: ProfileForm,
    ) -> ChatResult<Profile> {
        let owner = self.owner(user_public_id).await?;
        PermissionChecker::can_modify_account(requester, owner.id)?;
        form.clean()?;

        self.profiles
            .update(owner.id, &form.into())
            .await?
            .ok_or_else(|| ChatError::not_found("profile", user_public_id))
    }

    pub async fn delete(&self, requester: &User, user_public_id: &str) -> ChatResult<()> {
        let owner = self.owner(user_public_id).await?;
        PermissionChecker::can_modify_account(requester, owner.id)?;

        if !self.profiles.delete(owner.id).await? {
            return Err(ChatError::not_found("profile", user_public_id));
        }
        Ok(())
    }
}
