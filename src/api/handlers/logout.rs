//! Logout endpoint: clears the session cookie.
//!
//! Tokens are stateless, so there is nothing to revoke server-side; the
//! token stays valid until expiry, and the cached flags bound means the UI
//! converges within a minute.

use anyhow::Context;
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::auth::{identity::clear_session_cookie, AuthState};

#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Session cookie cleared"),
    ),
    tag = "auth"
)]
pub async fn logout(state: Extension<Arc<AuthState>>) -> Result<impl IntoResponse, ApiError> {
    // Always clear the cookie, even when no session was presented.
    let cookie = clear_session_cookie(state.config())
        .context("failed to build clearing cookie")
        .map_err(ApiError::Internal)?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok((headers, Json(json!({ "message": "Logout successful" }))))
}
