//! Extractors that report malformed input with the JSON failure envelope.
//!
//! Authenticated handlers take `Result<ApiJson<T>, ApiError>` and unwrap it after
//! the bearer check, so a bad token wins over a bad body.

use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::Json;

use crate::ApiError;

#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
