use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    extract::{ApiJson, ApiQuery},
    routes::models::{
        AddParticipantsRequest, ConversationResponse, ConversationsResponse,
        CreateConversationRequest, CreateMessageRequest, MessageSummary, MessagesQuery,
        ParticipantsResponse, SuccessResponse, UpdateConversationRequest,
    },
    util::require_bearer,
    ApiError, AppState,
};

/// Total number of messages in the conversation, independent of the page.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

#[utoipa::path(
    get,
    path = "/api/conversations",
    tag = "Conversations",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Conversations the user participates in, most recent first", body = ConversationsResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ConversationsResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let conversations = state.conversations().list_for(&user).await?;
    Ok(Json(ConversationsResponse {
        conversations: conversations
            .into_iter()
            .map(ConversationResponse::from)
            .collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/conversations",
    tag = "Conversations",
    security(("bearerAuth" = [])),
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = SuccessResponse),
        (status = 400, description = "Invalid title or unknown participants", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<ApiJson<CreateConversationRequest>, ApiError>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let ApiJson(req) = body?;

    let conversation = state.conversations().create(&user, req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(conversation.public_id)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_id}",
    tag = "Conversations",
    security(("bearerAuth" = [])),
    params(
        ("conversation_id" = String, Path, description = "Public id of the conversation"),
        MessagesQuery
    ),
    responses(
        (status = 200, description = "Messages in posting order", body = [MessageSummary],
            headers(("x-total-count" = i64, description = "Messages in the whole conversation"))),
        (status = 400, description = "Invalid limit or offset", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not a participant", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown conversation", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    headers: HeaderMap,
    query: Result<ApiQuery<MessagesQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let ApiQuery(query) = query?;

    let page = state
        .conversations()
        .messages(&user, &conversation_id, query.limit, query.offset)
        .await?;

    let messages: Vec<MessageSummary> = page.messages.into_iter().map(Into::into).collect();
    Ok(([(TOTAL_COUNT_HEADER, page.total.to_string())], Json(messages)))
}

#[utoipa::path(
    put,
    path = "/api/conversations/{conversation_id}",
    tag = "Conversations",
    security(("bearerAuth" = [])),
    params(("conversation_id" = String, Path, description = "Public id of the conversation")),
    request_body = UpdateConversationRequest,
    responses(
        (status = 200, description = "Conversation updated", body = SuccessResponse),
        (status = 400, description = "Invalid title or participants", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not a participant", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown conversation", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    headers: HeaderMap,
    body: Result<ApiJson<UpdateConversationRequest>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let ApiJson(req) = body?;

    let conversation = state
        .conversations()
        .update(&user, &conversation_id, req.into())
        .await?;
    Ok(Json(SuccessResponse::new(conversation.public_id)))
}

#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_id}/participants",
    tag = "Conversations",
    security(("bearerAuth" = [])),
    params(("conversation_id" = String, Path, description = "Public id of the conversation")),
    responses(
        (status = 200, description = "Participants in joining order", body = ParticipantsResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not a participant", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown conversation", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_participants(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ParticipantsResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let participants = state
        .conversations()
        .participants(&user, &conversation_id)
        .await?;
    Ok(Json(participants.into()))
}

#[utoipa::path(
    post,
    path = "/api/conversations/{conversation_id}/participants",
    tag = "Conversations",
    security(("bearerAuth" = [])),
    params(("conversation_id" = String, Path, description = "Public id of the conversation")),
    request_body = AddParticipantsRequest,
    responses(
        (status = 200, description = "Participants after the addition", body = ParticipantsResponse),
        (status = 400, description = "Empty list or unknown users", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not a participant", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown conversation", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_participants(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    headers: HeaderMap,
    body: Result<ApiJson<AddParticipantsRequest>, ApiError>,
) -> Result<Json<ParticipantsResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let ApiJson(req) = body?;

    let participants = state
        .conversations()
        .add_participants(&user, &conversation_id, req.into())
        .await?;
    Ok(Json(participants.into()))
}

#[utoipa::path(
    delete,
    path = "/api/conversations/{conversation_id}/participants/{user_id}",
    tag = "Conversations",
    security(("bearerAuth" = [])),
    params(
        ("conversation_id" = String, Path, description = "Public id of the conversation"),
        ("user_id" = String, Path, description = "Public id of the participant to remove")
    ),
    responses(
        (status = 200, description = "Participant removed", body = SuccessResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Only the creator may remove others", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown conversation or participant", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_participant(
    State(state): State<AppState>,
    Path((conversation_id, user_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    state
        .conversations()
        .remove_participant(&user, &conversation_id, &user_id)
        .await?;
    Ok(Json(SuccessResponse::new(user_id)))
}

#[utoipa::path(
    post,
    path = "/api/conversations/{conversation_id}/messages",
    tag = "Messages",
    security(("bearerAuth" = [])),
    params(("conversation_id" = String, Path, description = "Public id of the conversation")),
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Message posted", body = SuccessResponse),
        (status = 400, description = "Blank or oversized text", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not a participant", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown conversation", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    headers: HeaderMap,
    body: Result<ApiJson<CreateMessageRequest>, ApiError>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let ApiJson(req) = body?;

    let message = state
        .messages()
        .create(&user, &conversation_id, req.into())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(message.public_id)),
    ))
}
