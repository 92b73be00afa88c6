use axum::response::Redirect;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub const OPENAPI_PATH: &str = "/docs/openapi.json";
pub const SWAGGER_UI_PATH: &str = "/swagger-ui";

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::users::create_user,
        crate::routes::users::get_user,
        crate::routes::users::update_user,
        crate::routes::users::delete_user,
        crate::routes::users::change_password,
        crate::routes::profiles::create_profile,
        crate::routes::profiles::get_profile,
        crate::routes::profiles::update_profile,
        crate::routes::profiles::delete_profile,
        crate::routes::conversations::list_conversations,
        crate::routes::conversations::create_conversation,
        crate::routes::conversations::get_conversation,
        crate::routes::conversations::update_conversation,
        crate::routes::conversations::list_participants,
        crate::routes::conversations::add_participants,
        crate::routes::conversations::remove_participant,
        crate::routes::conversations::create_message,
        crate::routes::messages::get_message,
        crate::routes::messages::delete_message
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::models::SuccessResponse,
            crate::routes::models::LoginRequest,
            crate::routes::models::LoginResponse,
            crate::routes::models::UserResponse,
            crate::routes::models::CreateUserRequest,
            crate::routes::models::UpdateUserRequest,
            crate::routes::models::ChangePasswordRequest,
            crate::routes::models::ProfileRequest,
            crate::routes::models::ProfileResponse,
            crate::routes::models::ConversationResponse,
            crate::routes::models::ConversationsResponse,
            crate::routes::models::CreateConversationRequest,
            crate::routes::models::UpdateConversationRequest,
            crate::routes::models::ParticipantResponse,
            crate::routes::models::ParticipantsResponse,
            crate::routes::models::AddParticipantsRequest,
            crate::routes::models::MessageSummary,
            crate::routes::models::MessageResponse,
            crate::routes::models::CreateMessageRequest
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Auth", description = "Sign-in and session management"),
        (name = "Users", description = "Account registration and management"),
        (name = "Profiles", description = "User profiles"),
        (name = "Conversations", description = "Conversations and their participants"),
        (name = "Messages", description = "Posting, reading and deleting messages")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        let schemes = &mut components.security_schemes;

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("Bearer".to_string());
        }

        schemes.insert("bearerAuth".to_string(), scheme);
    }
}

pub async fn docs_redirect() -> Redirect {
    Redirect::temporary(&format!("{SWAGGER_UI_PATH}/"))
}
