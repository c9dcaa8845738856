//! Login endpoint.
//!
//! The session token is delivered only as an `HttpOnly` cookie; the body
//! carries the public user projection. Returning the token in the body was
//! considered and rejected; it invites non-httpOnly storage on the client.

use anyhow::Context;
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::auth::{identity::session_cookie, service, AuthState};
use crate::store::{PublicUser, UserStore};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: PublicUser,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = LoginResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    state: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn UserStore>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(payload)) = payload else {
        return Err(ApiError::validation(
            "Missing fields",
            "Please enter email and password",
        ));
    };

    let user = service::login(store.0.as_ref(), &payload.email, &payload.password).await?;

    let token = state.tokens().issue(user.id)?;
    let cookie = session_cookie(state.config(), &token)
        .context("failed to build session cookie")
        .map_err(ApiError::Internal)?;

    info!("Login successful for {}", user.email);

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok((
        headers,
        Json(LoginResponse {
            user,
            message: "Login successful!".to_string(),
        }),
    ))
}
