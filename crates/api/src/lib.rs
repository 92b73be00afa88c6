//! # Parley API Crate
//!
//! The REST surface of the chat demo. Handlers authenticate the bearer token,
//! hand typed forms to the chat services and wrap results in the
//! `{"result": "success" | "fail", ...}` envelope.

mod error;
mod extract;
mod middleware;
mod state;
mod util;

pub mod docs;
pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use extract::{ApiJson, ApiQuery};
pub use state::AppState;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::{ApiDoc, OPENAPI_PATH, SWAGGER_UI_PATH};
use crate::middleware::logging_middleware;
use crate::routes::method_not_allowed;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index::index))
        .route("/health", get(routes::health::health_check))
        .route("/docs", get(docs::docs_redirect))
        // Auth routes
        .route(
            "/api/auth/login",
            post(routes::auth::login).fallback(method_not_allowed),
        )
        .route(
            "/api/auth/logout",
            post(routes::auth::logout).fallback(method_not_allowed),
        )
        .route(
            "/api/auth/me",
            get(routes::auth::me).fallback(method_not_allowed),
        )
        // User routes
        .route(
            "/api/users",
            post(routes::users::create_user).fallback(method_not_allowed),
        )
        .route(
            "/api/users/:user_id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/users/:user_id/password",
            put(routes::users::change_password).fallback(method_not_allowed),
        )
        // Profile routes
        .route(
            "/api/profiles",
            post(routes::profiles::create_profile).fallback(method_not_allowed),
        )
        .route(
            "/api/profiles/:user_id",
            get(routes::profiles::get_profile)
                .put(routes::profiles::update_profile)
                .delete(routes::profiles::delete_profile)
                .fallback(method_not_allowed),
        )
        // Conversation routes
        .route(
            "/api/conversations",
            get(routes::conversations::list_conversations)
                .post(routes::conversations::create_conversation)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/conversations/:conversation_id",
            get(routes::conversations::get_conversation)
                .put(routes::conversations::update_conversation)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/conversations/:conversation_id/participants",
            get(routes::conversations::list_participants)
                .post(routes::conversations::add_participants)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/conversations/:conversation_id/participants/:user_id",
            delete(routes::conversations::remove_participant).fallback(method_not_allowed),
        )
        .route(
            "/api/conversations/:conversation_id/messages",
            post(routes::conversations::create_message).fallback(method_not_allowed),
        )
        // Message routes
        .route(
            "/api/messages/:message_id",
            get(routes::messages::get_message)
                .delete(routes::messages::delete_message)
                .fallback(method_not_allowed),
        )
        .merge(SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_PATH, ApiDoc::openapi()))
        .fallback(routes::not_found)
        .with_state(state)
        .layer(from_fn(logging_middleware))
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
