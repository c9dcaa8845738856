//! Per-request identity resolution and session cookie handling.
//!
//! Flow Overview: locate a candidate token (bearer header first, then the
//! session cookie), verify it, and resolve the user. Two composable
//! transforms share that logic: [`resolve_identity`] never fails, any
//! problem collapses to an anonymous request, while [`require_identity`]
//! turns a missing identity into a 401. Routes with optional identity use
//! the former; `/api/me` uses the latter.

use axum::http::{
    header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};
use serde::Serialize;
use tracing::{debug, error};
use utoipa::ToSchema;
use uuid::Uuid;

use super::state::{AuthConfig, AuthState, SESSION_COOKIE_NAME};
use crate::api::error::ApiError;
use crate::flags::Role;
use crate::store::UserStore;

/// Identity attached to a request after successful token verification.
/// Exists only for the duration of one request.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Soft auth: resolve a token into an identity if possible, anonymous
/// otherwise. Never rejects the request: bad tokens, expired tokens, and
/// ids of since-deleted users all degrade to `None`.
pub async fn resolve_identity(
    headers: &HeaderMap,
    state: &AuthState,
    store: &dyn UserStore,
) -> Option<Identity> {
    let token = extract_session_token(headers)?;
    let user_id = match state.tokens().verify(&token) {
        Ok(user_id) => user_id,
        Err(err) => {
            debug!("Ignoring unverifiable session token: {err}");
            return None;
        }
    };
    match store.find_by_id(user_id).await {
        Ok(Some(user)) => Some(Identity {
            id: user.id,
            email: user.email,
            role: user.role,
        }),
        Ok(None) => {
            debug!("Token references a user that no longer exists");
            None
        }
        Err(err) => {
            // Store outages also degrade to anonymous; the flags endpoint
            // must keep serving defaults.
            error!("Failed to resolve user for session token: {err}");
            None
        }
    }
}

/// Hard auth: like [`resolve_identity`] but absence is an error.
///
/// # Errors
/// [`ApiError::Unauthorized`] when no identity can be resolved.
pub async fn require_identity(
    headers: &HeaderMap,
    state: &AuthState,
    store: &dyn UserStore,
) -> Result<Identity, ApiError> {
    resolve_identity(headers, state, store)
        .await
        .ok_or(ApiError::Unauthorized)
}

/// Build the `Set-Cookie` value delivering a session token.
///
/// # Errors
/// Returns an error when the token contains bytes invalid in a header.
pub fn session_cookie(config: &AuthConfig, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let same_site = config.session_cookie_same_site();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite={same_site}; Max-Age={ttl_seconds}"
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the `Set-Cookie` value clearing the session cookie.
///
/// # Errors
/// Returns an error when the cookie attributes form an invalid header.
pub fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let same_site = config.session_cookie_same_site();
    let mut cookie =
        format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite={same_site}; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenService;
    use crate::store::MemoryUserStore;
    use secrecy::SecretString;

    fn auth_state() -> AuthState {
        let secret = SecretString::from("test-secret-key-long-enough-for-hs256".to_string());
        AuthState::new(
            AuthConfig::new("http://localhost:3030"),
            TokenService::new(&secret, 3600),
        )
    }

    fn headers_with(name: axum::http::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = headers_with(AUTHORIZATION, "Bearer from-header");
        headers.insert(
            COOKIE,
            HeaderValue::from_static("auth_token=from-cookie; theme=dark"),
        );
        assert_eq!(
            extract_session_token(&headers).as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn cookie_is_used_when_no_bearer() {
        let headers = headers_with(COOKIE, "theme=dark; auth_token=from-cookie");
        assert_eq!(
            extract_session_token(&headers).as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn empty_bearer_is_ignored() {
        let headers = headers_with(AUTHORIZATION, "Bearer ");
        assert!(extract_session_token(&headers).is_none());
    }

    #[test]
    fn no_credentials_means_no_token() {
        assert!(extract_session_token(&HeaderMap::new()).is_none());
    }

    #[tokio::test]
    async fn resolve_is_anonymous_for_bad_token() {
        let state = auth_state();
        let store = MemoryUserStore::new();
        let headers = headers_with(AUTHORIZATION, "Bearer not.a.token");
        assert!(resolve_identity(&headers, &state, &store).await.is_none());
    }

    #[tokio::test]
    async fn resolve_is_anonymous_for_deleted_user() {
        let state = auth_state();
        let store = MemoryUserStore::new();
        // Valid token, but the user id was never persisted.
        let token = state.tokens().issue(Uuid::new_v4()).unwrap();
        let headers = headers_with(AUTHORIZATION, &format!("Bearer {token}"));
        assert!(resolve_identity(&headers, &state, &store).await.is_none());
    }

    #[tokio::test]
    async fn resolve_attaches_identity_for_valid_token() {
        let state = auth_state();
        let store = MemoryUserStore::new();
        let user = store
            .insert_user("a@example.com", "hash", Role::Editor)
            .await
            .unwrap();
        let token = state.tokens().issue(user.id).unwrap();
        let headers = headers_with(COOKIE, &format!("auth_token={token}"));

        let identity = resolve_identity(&headers, &state, &store).await.unwrap();
        assert_eq!(identity.id, user.id);
        assert_eq!(identity.email, "a@example.com");
        assert_eq!(identity.role, Role::Editor);
    }

    #[tokio::test]
    async fn require_identity_rejects_anonymous() {
        let state = auth_state();
        let store = MemoryUserStore::new();
        let err = require_identity(&HeaderMap::new(), &state, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn dev_cookie_is_lax_and_not_secure() {
        let config = AuthConfig::new("http://localhost:3030");
        let cookie = session_cookie(&config, "tok").unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("auth_token=tok; Path=/; HttpOnly; SameSite=Lax"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn production_cookie_is_strict_and_secure() {
        let config = AuthConfig::new("https://app.example.com").with_production(true);
        let cookie = session_cookie(&config, "tok").unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.contains("SameSite=Strict"));
        assert!(value.ends_with("; Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let config = AuthConfig::new("http://localhost:3030");
        let cookie = clear_session_cookie(&config).unwrap();
        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
    }
}
