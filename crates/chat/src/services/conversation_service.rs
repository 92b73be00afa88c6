//! Conversation service for managing conversations and their participants.

use parley_config::ChatConfig;
use parley_database::{
    Conversation, ConversationRepository, Message, MessageRepository, Participant, SqlitePool,
    User, UserRepository,
};
use serde::Serialize;
use tracing::info;

use crate::forms::{ConversationCreateForm, ConversationForm, FormErrors, ParticipantsForm};
use crate::types::{ChatError, ChatResult};
use crate::utils::PermissionChecker;

/// A window of messages plus the total count for the conversation.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Service for managing conversation operations
#[derive(Clone)]
pub struct ConversationService {
    users: UserRepository,
    conversations: ConversationRepository,
    messages: MessageRepository,
    config: ChatConfig,
}

impl ConversationService {
    pub fn new(pool: SqlitePool, config: ChatConfig) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            conversations: ConversationRepository::new(pool.clone()),
            messages: MessageRepository::new(pool),
            config,
        }
    }

    /// Start a conversation. The requester is always a participant.
    pub async fn create(
        &self,
        requester: &User,
        mut form: ConversationCreateForm,
    ) -> ChatResult<Conversation> {
        form.clean()?;

        let mut participant_ids = vec![requester.id];
        for user in self.resolve_participants(&form.participants).await? {
            if !participant_ids.contains(&user.id) {
                participant_ids.push(user.id);
            }
        }

        let title = form.title.as_deref().filter(|t| !t.is_empty());
        let conversation = self
            .conversations
            .create(requester.id, title, &participant_ids)
            .await?;

        Ok(conversation)
    }

    pub async fn list_for(&self, requester: &User) -> ChatResult<Vec<Conversation>> {
        Ok(self.conversations.list_for_user(requester.id).await?)
    }

    pub async fn get(&self, requester: &User, public_id: &str) -> ChatResult<Conversation> {
        let conversation = self.find(public_id).await?;
        let is_participant = self
            .conversations
            .is_participant(conversation.id, requester.id)
            .await?;
        PermissionChecker::can_access_conversation(is_participant)?;
        Ok(conversation)
    }

    /// Messages in posting order. `limit` defaults to the configured page size and is
    /// capped at the configured maximum.
    pub async fn messages(
        &self,
        requester: &User,
        public_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ChatResult<MessagePage> {
        let conversation = self.get(requester, public_id).await?;
        let (limit, offset) = self.page_bounds(limit, offset)?;

        let messages = self
            .messages
            .list_for_conversation(conversation.id, limit, offset)
            .await?;
        let total = self.messages.count_for_conversation(conversation.id).await?;

        Ok(MessagePage {
            messages,
            total,
            limit,
            offset,
        })
    }

    pub async fn participants(
        &self,
        requester: &User,
        public_id: &str,
    ) -> ChatResult<Vec<Participant>> {
        let conversation = self.get(requester, public_id).await?;
        Ok(self.conversations.participants(conversation.id).await?)
    }

    /// Change the title and/or replace the participant set.
    pub async fn update(
        &self,
        requester: &User,
        public_id: &str,
        mut form: ConversationForm,
    ) -> ChatResult<Conversation> {
        let conversation = self.get(requester, public_id).await?;
        form.clean()?;

        if let Some(participants) = &form.participants {
            let ids: Vec<i64> = self
                .resolve_participants(participants)
                .await?
                .iter()
                .map(|user| user.id)
                .collect();
            self.conversations
                .replace_participants(conversation.id, &ids)
                .await?;
        }

        if let Some(title) = &form.title {
            self.conversations
                .update_title(conversation.id, Some(title))
                .await?
                .ok_or_else(|| ChatError::not_found("conversation", public_id))?;
        }

        info!(conversation = %conversation.public_id, by = requester.id, "updated conversation");

        self.conversations
            .find_by_id(conversation.id)
            .await?
            .ok_or_else(|| ChatError::not_found("conversation", public_id))
    }

    pub async fn add_participants(
        &self,
        requester: &User,
        public_id: &str,
        mut form: ParticipantsForm,
    ) -> ChatResult<Vec<Participant>> {
        let conversation = self.get(requester, public_id).await?;
        form.clean()?;

        let ids: Vec<i64> = self
            .resolve_participants(&form.participants)
            .await?
            .iter()
            .map(|user| user.id)
            .collect();
        self.conversations
            .add_participants(conversation.id, &ids)
            .await?;

        Ok(self.conversations.participants(conversation.id).await?)
    }

    /// Leave a conversation, or (as its creator) remove someone else from it.
    pub async fn remove_participant(
        &self,
        requester: &User,
        public_id: &str,
        user_public_id: &str,
    ) -> ChatResult<()> {
        let conversation = self.get(requester, public_id).await?;
        let target = self
            .users
            .find_by_public_id(user_public_id)
            .await?
            .ok_or_else(|| ChatError::not_found("user", user_public_id))?;

        PermissionChecker::can_remove_participant(requester, &conversation, target.id)?;

        if !self
            .conversations
            .remove_participant(conversation.id, target.id)
            .await?
        {
            return Err(ChatError::not_found("participant", user_public_id));
        }

        info!(
            conversation = %conversation.public_id,
            user = %target.public_id,
            by = requester.id,
            "removed participant"
        );
        Ok(())
    }

    async fn find(&self, public_id: &str) -> ChatResult<Conversation> {
        self.conversations
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| ChatError::not_found("conversation", public_id))
    }

    /// Look up every public id, reporting unknown ones as a `participants` field error.
    async fn resolve_participants(&self, public_ids: &[String]) -> ChatResult<Vec<User>> {
        let users = self.users.find_by_public_ids(public_ids).await?;

        let mut errors = FormErrors::new();
        for public_id in public_ids {
            if !users.iter().any(|user| &user.public_id == public_id) {
                errors.add("participants", format!("Unknown user: {public_id}"));
            }
        }
        errors.into_result()?;

        Ok(users)
    }

    fn page_bounds(&self, limit: Option<i64>, offset: Option<i64>) -> ChatResult<(i64, i64)> {
        let mut errors = FormErrors::new();

        let limit = limit.unwrap_or(i64::from(self.config.default_page_size));
        if limit < 1 {
            errors.add("limit", "Ensure this value is greater than or equal to 1.");
        }
        let offset = offset.unwrap_or(0);
        if offset < 0 {
            errors.add("offset", "Ensure this value is greater than or equal to 0.");
        }
        errors.into_result()?;

        Ok((limit.min(i64::from(self.config.max_page_size)), offset))
    }
}
