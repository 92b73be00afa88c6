pub mod auth;
pub mod conversations;
pub mod health;
pub mod index;
pub mod messages;
pub mod models;
pub mod profiles;
pub mod users;

use axum::http::{Method, Uri};

use crate::ApiError;

/// Fallback for verbs a resource does not support.
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::method_not_allowed(format!(
        "method {method} is not supported for {}",
        uri.path()
    ))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("no resource at {}", uri.path()))
}
