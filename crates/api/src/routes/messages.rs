use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use crate::{
    routes::models::{MessageResponse, SuccessResponse},
    util::require_bearer,
    ApiError, AppState,
};

#[utoipa::path(
    get,
    path = "/api/messages/{message_id}",
    tag = "Messages",
    security(("bearerAuth" = [])),
    params(("message_id" = String, Path, description = "Public id of the message")),
    responses(
        (status = 200, description = "Message details", body = MessageResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not a participant of the message's conversation", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown message", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let message = state.messages().get(&user, &message_id).await?;
    Ok(Json(message.into()))
}

#[utoipa::path(
    delete,
    path = "/api/messages/{message_id}",
    tag = "Messages",
    security(("bearerAuth" = [])),
    params(("message_id" = String, Path, description = "Public id of the message")),
    responses(
        (status = 200, description = "Message deleted", body = SuccessResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Only the sender may delete a message", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown message", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    state.messages().delete(&user, &message_id).await?;
    Ok(Json(SuccessResponse::new(message_id)))
}
