use parley_auth::{AuthSession, Authenticator};
use parley_chat::{ConversationService, MessageService, ProfileService, UserService};
use parley_config::ChatConfig;
use parley_database::{SqlitePool, User};

use crate::ApiError;

#[derive(Clone)]
pub struct AppState {
    authenticator: Authenticator,
    users: UserService,
    profiles: ProfileService,
    conversations: ConversationService,
    messages: MessageService,
}

impl AppState {
    pub fn new(pool: SqlitePool, authenticator: Authenticator, chat: ChatConfig) -> Self {
        Self {
            users: UserService::new(pool.clone(), authenticator.clone()),
            profiles: ProfileService::new(pool.clone()),
            conversations: ConversationService::new(pool.clone(), chat.clone()),
            messages: MessageService::new(pool, chat),
            authenticator,
        }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    pub fn conversations(&self) -> &ConversationService {
        &self.conversations
    }

    pub fn messages(&self) -> &MessageService {
        &self.messages
    }

    pub async fn authenticate(&self, token: &str) -> Result<(User, AuthSession), ApiError> {
        self.authenticator
            .authenticate_token(token)
            .await
            .map_err(ApiError::from)
    }
}
