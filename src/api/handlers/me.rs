//! Authenticated self endpoint.

use axum::{extract::Extension, http::HeaderMap, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::auth::{require_identity, AuthState, Identity};
use crate::store::UserStore;

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "The authenticated identity", body = Identity),
        (status = 401, description = "No resolvable identity"),
    ),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn UserStore>>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = require_identity(&headers, &state, store.0.as_ref()).await?;
    Ok(Json(identity))
}
