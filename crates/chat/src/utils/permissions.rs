//! Permission checking utilities.

use parley_database::{Conversation, Message, User};

use crate::types::ChatError;

/// Permission checking utilities
pub struct PermissionChecker;

impl PermissionChecker {
    /// Accounts and profiles can only be changed by their owner
    pub fn can_modify_account(requester: &User, owner_id: i64) -> Result<(), ChatError> {
        if requester.id != owner_id {
            return Err(ChatError::access_denied(
                "You can only modify your own account",
            ));
        }
        Ok(())
    }

    /// Reading, updating and posting into a conversation require participation
    pub fn can_access_conversation(is_participant: bool) -> Result<(), ChatError> {
        if !is_participant {
            return Err(ChatError::access_denied(
                "You are not a participant of this conversation",
            ));
        }
        Ok(())
    }

    /// A message is readable by the participants of its conversation
    pub fn can_read_message(is_participant: bool) -> Result<(), ChatError> {
        if !is_participant {
            return Err(ChatError::access_denied(
                "You are not a participant of this message's conversation",
            ));
        }
        Ok(())
    }

    /// Only the sender can delete a message
    pub fn can_delete_message(requester: &User, message: &Message) -> Result<(), ChatError> {
        if !message.is_sent_by(requester.id) {
            return Err(ChatError::access_denied(
                "Only the sender can delete a message",
            ));
        }
        Ok(())
    }

    /// Participants may leave; removing someone else is reserved for the creator
    pub fn can_remove_participant(
        requester: &User,
        conversation: &Conversation,
        target_user_id: i64,
    ) -> Result<(), ChatError> {
        if requester.id == target_user_id || conversation.is_created_by(requester.id) {
            return Ok(());
        }
        Err(ChatError::access_denied(
            "Only the conversation creator can remove other participants",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> User {
        User {
            id,
            public_id: format!("user-{id}"),
            username: format!("user{id}"),
            email: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            last_login_at: None,
        }
    }

    fn conversation(created_by: Option<i64>) -> Conversation {
        Conversation {
            id: 1,
            public_id: "conv".to_string(),
            title: None,
            created_by,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn message(sender_id: i64) -> Message {
        Message {
            id: 1,
            public_id: "msg".to_string(),
            conversation_id: 1,
            conversation_public_id: "conv".to_string(),
            sender_id,
            sender_public_id: format!("user-{sender_id}"),
            sender_username: format!("user{sender_id}"),
            text: "hi".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_permission_checker_can_modify_account() {
        assert!(PermissionChecker::can_modify_account(&user(1), 1).is_ok());
        assert!(PermissionChecker::can_modify_account(&user(1), 2).is_err());
    }

    #[test]
    fn test_permission_checker_conversation_access() {
        assert!(PermissionChecker::can_access_conversation(true).is_ok());
        assert!(matches!(
            PermissionChecker::can_access_conversation(false),
            Err(ChatError::AccessDenied { .. })
        ));
        assert!(PermissionChecker::can_read_message(true).is_ok());
        assert!(PermissionChecker::can_read_message(false).is_err());
    }

    #[test]
    fn test_permission_checker_can_delete_message() {
        assert!(PermissionChecker::can_delete_message(&user(1), &message(1)).is_ok());
        assert!(PermissionChecker::can_delete_message(&user(2), &message(1)).is_err());
    }

    #[test]
    fn test_permission_checker_can_remove_participant() {
        let owned = conversation(Some(1));

        // Creator can remove anyone
        assert!(PermissionChecker::can_remove_participant(&user(1), &owned, 2).is_ok());

        // Anyone can leave
        assert!(PermissionChecker::can_remove_participant(&user(2), &owned, 2).is_ok());

        // Others cannot remove each other
        assert!(PermissionChecker::can_remove_participant(&user(2), &owned, 3).is_err());

        // Orphaned conversations only allow leaving
        let orphaned = conversation(None);
        assert!(PermissionChecker::can_remove_participant(&user(2), &orphaned, 3).is_err());
        assert!(PermissionChecker::can_remove_participant(&user(3), &orphaned, 3).is_ok());
    }
}
