//! Conversation entity definitions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    pub title: Option<String>,
    /// `None` once the creating account has been deleted.
    #[serde(skip_serializing)]
    pub created_by: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl Conversation {
    pub fn is_created_by(&self, user_id: i64) -> bool {
        self.created_by == Some(user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participant {
    #[serde(skip_serializing)]
    pub conversation_id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub user_public_id: String,
    pub username: String,
    pub joined_at: String,
}
