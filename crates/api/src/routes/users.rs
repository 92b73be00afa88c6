use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::{
    extract::ApiJson,
    routes::models::{
        ChangePasswordRequest, CreateUserRequest, SuccessResponse, UpdateUserRequest, UserResponse,
    },
    util::require_bearer,
    ApiError, AppState,
};

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = SuccessResponse),
        (status = 400, description = "Invalid registration data", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    let user = state.users().register(req.into()).await?;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(user.public_id))))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "Public id of the user")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown user", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    state.authenticate(&token).await?;

    let user = state.users().get(&user_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "Public id of the user")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = SuccessResponse),
        (status = 400, description = "Invalid account data", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not your account", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown user", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    body: Result<ApiJson<UpdateUserRequest>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let ApiJson(req) = body?;

    let updated = state.users().update(&user, &user_id, req.into()).await?;
    Ok(Json(SuccessResponse::new(updated.public_id)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "Public id of the user")),
    responses(
        (status = 200, description = "Account deleted", body = SuccessResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not your account", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown user", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    state.users().delete(&user, &user_id).await?;
    Ok(Json(SuccessResponse::new(user_id)))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}/password",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "Public id of the user")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed; other sessions revoked", body = SuccessResponse),
        (status = 400, description = "Wrong current password or weak new password", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not your account", body = crate::error::ErrorResponse)
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    body: Result<ApiJson<ChangePasswordRequest>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let ApiJson(req) = body?;

    let revoked = state
        .users()
        .change_password(&user, &user_id, req.into(), Some(&token))
        .await?;
    tracing::info!(user = %user.public_id, revoked, "password changed");

    Ok(Json(SuccessResponse::new(user_id)))
}
