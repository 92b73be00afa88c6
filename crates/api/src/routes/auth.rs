use axum::{extract::State, http::HeaderMap, Json};
use parley_chat::LoginForm;

use crate::{
    extract::ApiJson,
    routes::models::{LoginRequest, LoginResponse, SuccessResponse, UserResponse, RESULT_SUCCESS},
    util::require_bearer,
    ApiError, AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 400, description = "Missing username or password", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut form = LoginForm::from(req);
    form.clean().map_err(ApiError::invalid_form)?;

    let session = state
        .authenticator()
        .login_with_password(&form.username, &form.password)
        .await?;
    let user = state.authenticator().user(session.user_id).await?;

    Ok(Json(LoginResponse {
        result: RESULT_SUCCESS.to_string(),
        id: user.public_id,
        token: session.token,
        expires_at: session.expires_at.to_rfc3339(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Session revoked", body = SuccessResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    state.authenticator().logout(&token).await?;

    Ok(Json(SuccessResponse::new(user.public_id)))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "The signed-in user", body = UserResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    Ok(Json(user.into()))
}
