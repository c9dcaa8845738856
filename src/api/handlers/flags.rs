//! Feature flags endpoint with conditional caching.
//!
//! Flow Overview: soft-resolve the identity, derive flags from the role, and
//! answer conditionally. One entity tag (user id, role, and a per-minute
//! bucket) serves both the `If-None-Match` comparison and the outgoing
//! `ETag`, so a client cache revalidates cheaply and observes a role change
//! or logout within the 60 second `max-age` bound.

use axum::{
    extract::Extension,
    http::{
        header::{CACHE_CONTROL, ETAG, IF_NONE_MATCH},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use crate::auth::{resolve_identity, AuthState};
use crate::flags::{derive_flags, flags_etag, minute_bucket, FeatureFlags};
use crate::store::UserStore;

const FLAGS_CACHE_CONTROL: &str = "private, max-age=60";

#[utoipa::path(
    get,
    path = "/api/flags",
    responses(
        (status = 200, description = "Capability set for the resolved role", body = FeatureFlags),
        (status = 304, description = "Client copy is still fresh"),
    ),
    tag = "flags"
)]
pub async fn flags(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn UserStore>>,
) -> impl IntoResponse {
    let identity = resolve_identity(&headers, &state, store.0.as_ref()).await;

    let who = identity
        .as_ref()
        .map_or("anonymous".to_string(), |identity| {
            format!("{} ({})", identity.role, identity.email)
        });
    debug!(user = %who, "Serving feature flags");

    let bucket = minute_bucket(Utc::now().timestamp());
    let etag = flags_etag(
        identity.as_ref().map(|identity| (identity.id, identity.role)),
        bucket,
    );

    let mut response_headers = HeaderMap::new();
    response_headers.insert(CACHE_CONTROL, HeaderValue::from_static(FLAGS_CACHE_CONTROL));
    if let Ok(value) = HeaderValue::from_str(&etag) {
        response_headers.insert(ETAG, value);
    }

    let revalidated = headers
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == etag);
    if revalidated {
        return (StatusCode::NOT_MODIFIED, response_headers).into_response();
    }

    let flags = derive_flags(identity.map(|identity| identity.role));
    (StatusCode::OK, response_headers, Json(flags)).into_response()
}
