//! Request and response bodies for the REST routes.
//!
//! Requests convert into the chat crate's forms; responses are built from
//! database entities and only expose public ids.

use parley_chat::{
    ConversationCreateForm, ConversationForm, LoginForm, MessageForm, ParticipantsForm,
    PasswordChangeForm, ProfileForm, UserCreateForm, UserForm,
};
use parley_database::{Conversation, Message, Participant, Profile, User};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const RESULT_SUCCESS: &str = "success";

/// Envelope returned by every successful mutation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    #[schema(example = "success")]
    pub result: String,
    pub id: String,
}

impl SuccessResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            result: RESULT_SUCCESS.to_string(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.public_id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub user_id: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            user_id: profile.user_public_id,
            display_name: profile.display_name,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConversationResponse {
    pub id: String,
    pub title: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Conversation> for ConversationResponse {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.public_id,
            title: conversation.title,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParticipantResponse {
    pub user_id: String,
    pub username: String,
    pub joined_at: String,
}

impl From<Participant> for ParticipantResponse {
    fn from(participant: Participant) -> Self {
        Self {
            user_id: participant.user_public_id,
            username: participant.username,
            joined_at: participant.joined_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParticipantsResponse {
    pub participants: Vec<ParticipantResponse>,
}

impl From<Vec<Participant>> for ParticipantsResponse {
    fn from(participants: Vec<Participant>) -> Self {
        Self {
            participants: participants.into_iter().map(Into::into).collect(),
        }
    }
}

/// One entry of a conversation's message list.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageSummary {
    pub id: String,
    /// Username of the sender.
    pub sender: String,
    pub sender_id: String,
    pub text: String,
    pub created_at: String,
}

impl From<Message> for MessageSummary {
    fn from(message: Message) -> Self {
        Self {
            id: message.public_id,
            sender: message.sender_username,
            sender_id: message.sender_public_id,
            text: message.text,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub sender: String,
    pub text: String,
    pub created_at: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.public_id,
            conversation_id: message.conversation_public_id,
            sender_id: message.sender_public_id,
            sender: message.sender_username,
            text: message.text,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessagesQuery {
    /// Page size; defaults to the configured page size and is capped at the maximum.
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl From<LoginRequest> for LoginForm {
    fn from(req: LoginRequest) -> Self {
        Self {
            username: req.username,
            password: req.password,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = "success")]
    pub result: String,
    /// Public id of the signed-in user.
    pub id: String,
    pub token: String,
    pub expires_at: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

impl From<CreateUserRequest> for UserCreateForm {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            password: req.password,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    /// An empty string clears the address.
    pub email: Option<String>,
}

impl From<UpdateUserRequest> for UserForm {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

impl From<ChangePasswordRequest> for PasswordChangeForm {
    fn from(req: ChangePasswordRequest) -> Self {
        Self {
            current_password: req.current_password,
            new_password: req.new_password,
        }
    }
}

/// Omitted fields are left alone; empty strings clear them.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProfileRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<ProfileRequest> for ProfileForm {
    fn from(req: ProfileRequest) -> Self {
        Self {
            display_name: req.display_name,
            bio: req.bio,
            avatar_url: req.avatar_url,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    pub title: Option<String>,
    /// Public ids of the other participants.
    #[serde(default)]
    pub participants: Vec<String>,
}

impl From<CreateConversationRequest> for ConversationCreateForm {
    fn from(req: CreateConversationRequest) -> Self {
        Self {
            title: req.title,
            participants: req.participants,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateConversationRequest {
    pub title: Option<String>,
    /// Replaces the participant set when present.
    pub participants: Option<Vec<String>>,
}

impl From<UpdateConversationRequest> for ConversationForm {
    fn from(req: UpdateConversationRequest) -> Self {
        Self {
            title: req.title,
            participants: req.participants,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddParticipantsRequest {
    #[serde(default)]
    pub participants: Vec<String>,
}

impl From<AddParticipantsRequest> for ParticipantsForm {
    fn from(req: AddParticipantsRequest) -> Self {
        Self {
            participants: req.participants,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    #[serde(default)]
    pub text: String,
}

impl From<CreateMessageRequest> for MessageForm {
    fn from(req: CreateMessageRequest) -> Self {
        Self { text: req.text }
    }
}
