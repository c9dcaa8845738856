//! Registration endpoint.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::auth::service;
use crate::flags::Role;
use crate::store::{PublicUser, UserStore};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    #[serde(flatten)]
    pub user: PublicUser,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = RegisterResponse),
        (status = 400, description = "Malformed email, short password, or unknown role"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "auth"
)]
pub async fn register(
    store: Extension<Arc<dyn UserStore>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(payload)) = payload else {
        return Err(ApiError::validation(
            "Missing fields",
            "Please fill in email, password and select role",
        ));
    };

    let role = payload.role.parse::<Role>().map_err(|_| {
        ApiError::validation(
            "Invalid role",
            "Please select one of the available roles: VIEWER, EDITOR, ADMIN",
        )
    })?;

    let user = service::register(store.0.as_ref(), &payload.email, &payload.password, role).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            message: "Registration successful!".to_string(),
        }),
    ))
}
