//! API error taxonomy with HTTP status mapping.
//!
//! Every variant maps to a status code and an `{error, message}` JSON body.
//! Internal failures are logged and replaced with a generic message. Token
//! verification failures never reach this type at all; soft auth swallows
//! them into anonymous handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed input (400).
    #[error("{message}")]
    Validation {
        error: &'static str,
        message: String,
    },

    /// Duplicate email (409).
    #[error("{message}")]
    Conflict {
        error: &'static str,
        message: String,
    },

    /// Bad credentials at login (401).
    #[error("invalid credentials")]
    Authentication,

    /// Identity required but absent (401).
    #[error("authentication required")]
    Unauthorized,

    /// Unexpected failure (500). The cause is logged, never sent.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(error: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            error,
            message: message.into(),
        }
    }

    pub fn conflict(error: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            error,
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation { error, message } => {
                (StatusCode::BAD_REQUEST, ErrorBody { error, message })
            }
            ApiError::Conflict { error, message } => {
                (StatusCode::CONFLICT, ErrorBody { error, message })
            }
            ApiError::Authentication => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "Invalid credentials",
                    message: "Invalid email or password. Please check your credentials."
                        .to_string(),
                },
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "Unauthorized",
                    message: "You must be logged in to access this page".to_string(),
                },
            ),
            ApiError::Internal(err) => {
                error!("Internal error: {err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Server error",
                        message: "An unexpected error occurred. Please try again later."
                            .to_string(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            status_of(ApiError::validation("Invalid email", "nope")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ApiError::conflict("User already exists", "taken")),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(ApiError::Authentication), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(ApiError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(ApiError::Internal(anyhow::anyhow!("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_is_withheld() {
        let response = ApiError::Internal(anyhow::anyhow!("constraint users_email_key violated"))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // The body is built from a generic template; the cause only goes to
        // the log. Nothing more to assert without draining the body here;
        // the router tests cover the serialized shape.
    }
}
