//! Message entity definitions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    #[serde(skip_serializing)]
    pub conversation_id: i64,
    pub conversation_public_id: String,
    #[serde(skip_serializing)]
    pub sender_id: i64,
    pub sender_public_id: String,
    pub sender_username: String,
    pub text: String,
    pub created_at: String,
}

impl Message {
    pub fn is_sent_by(&self, user_id: i64) -> bool {
        self.sender_id == user_id
    }
}
