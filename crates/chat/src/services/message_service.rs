//! Message service for managing message operations.

use parley_config::ChatConfig;
use parley_database::{
    ConversationRepository, Message, MessageRepository, SqlitePool, User,
};
use tracing::info;

use crate::forms::MessageForm;
use crate::types::{ChatError, ChatResult};
use crate::utils::PermissionChecker;

/// Service for managing message operations
#[derive(Clone)]
pub struct MessageService {
    conversations: ConversationRepository,
    messages: MessageRepository,
    config: ChatConfig,
}

impl MessageService {
    pub fn new(pool: SqlitePool, config: ChatConfig) -> Self {
        Self {
            conversations: ConversationRepository::new(pool.clone()),
            messages: MessageRepository::new(pool),
            config,
        }
    }

    /// Post a message into a conversation the requester participates in.
    pub async fn create(
        &self,
        requester: &User,
        conversation_public_id: &str,
        mut form: MessageForm,
    ) -> ChatResult<Message> {
        let conversation = self
            .conversations
            .find_by_public_id(conversation_public_id)
            .await?
            .ok_or_else(|| ChatError::not_found("conversation", conversation_public_id))?;

        let is_participant = self
            .conversations
            .is_participant(conversation.id, requester.id)
            .await?;
        PermissionChecker::can_access_conversation(is_participant)?;

        form.clean(self.config.max_message_length)?;

        let message = self
            .messages
            .create(conversation.id, requester.id, &form.text)
            .await?;
        Ok(message)
    }

    pub async fn get(&self, requester: &User, public_id: &str) -> ChatResult<Message> {
        let message = self.find(public_id).await?;
        let is_participant = self
            .conversations
            .is_participant(message.conversation_id, requester.id)
            .await?;
        PermissionChecker::can_read_message(is_participant)?;
        Ok(message)
    }

    pub async fn delete(&self, requester: &User, public_id: &str) -> ChatResult<()> {
        let message = self.find(public_id).await?;
        PermissionChecker::can_delete_message(requester, &message)?;

        if !self.messages.delete(message.id).await? {
            return Err(ChatError::not_found("message", public_id));
        }

        info!(message = %message.public_id, by = requester.id, "deleted message");
        Ok(())
    }

    async fn find(&self, public_id: &str) -> ChatResult<Message> {
        self.messages
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| ChatError::not_found("message", public_id))
    }
}
