use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::{
    extract::ApiJson,
    routes::models::{ProfileRequest, ProfileResponse, SuccessResponse},
    util::require_bearer,
    ApiError, AppState,
};

#[utoipa::path(
    post,
    path = "/api/profiles",
    tag = "Profiles",
    security(("bearerAuth" = [])),
    request_body = ProfileRequest,
    responses(
        (status = 201, description = "Profile created for the signed-in user", body = SuccessResponse),
        (status = 400, description = "Invalid profile data", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 409, description = "Profile already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<ApiJson<ProfileRequest>, ApiError>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let ApiJson(req) = body?;

    let profile = state.profiles().create(&user, req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(profile.user_public_id)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/profiles/{user_id}",
    tag = "Profiles",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "Public id of the profile owner")),
    responses(
        (status = 200, description = "Profile details", body = ProfileResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown user or no profile", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    state.authenticate(&token).await?;

    let profile = state.profiles().get(&user_id).await?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    put,
    path = "/api/profiles/{user_id}",
    tag = "Profiles",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "Public id of the profile owner")),
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = SuccessResponse),
        (status = 400, description = "Invalid profile data", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not your profile", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown user or no profile", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    body: Result<ApiJson<ProfileRequest>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let ApiJson(req) = body?;

    let profile = state.profiles().update(&user, &user_id, req.into()).await?;
    Ok(Json(SuccessResponse::new(profile.user_public_id)))
}

#[utoipa::path(
    delete,
    path = "/api/profiles/{user_id}",
    tag = "Profiles",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "Public id of the profile owner")),
    responses(
        (status = 200, description = "Profile deleted", body = SuccessResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not your profile", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown user or no profile", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    state.profiles().delete(&user, &user_id).await?;
    Ok(Json(SuccessResponse::new(user_id)))
}
