//! Auth configuration and shared state.

use anyhow::{anyhow, Context, Result};
use axum::http::HeaderValue;
use url::Url;

use super::token::TokenService;

/// Token and session cookie lifetime: 7 days. Tokens are stateless and never
/// revoked server-side, so the TTL is the only bound on a session.
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

pub const SESSION_COOKIE_NAME: &str = "auth_token";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_urls: Vec<String>,
    production: bool,
    session_ttl_seconds: i64,
}

impl AuthConfig {
    /// `frontend_urls` accepts a comma-separated list of allowed client
    /// origins.
    #[must_use]
    pub fn new(frontend_urls: &str) -> Self {
        Self {
            frontend_urls: frontend_urls
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(ToString::to_string)
                .collect(),
            production: false,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn production(&self) -> bool {
        self.production
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    /// Cookies are only marked `Secure` and `SameSite=Strict` in production;
    /// development keeps `SameSite=Lax` so a localhost client can log in.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.production
    }

    #[must_use]
    pub fn session_cookie_same_site(&self) -> &'static str {
        if self.production {
            "Strict"
        } else {
            "Lax"
        }
    }

    /// CORS origins derived from the configured frontend URLs.
    ///
    /// # Errors
    /// Returns an error when a configured URL is not a valid origin.
    pub fn allowed_origins(&self) -> Result<Vec<HeaderValue>> {
        if self.frontend_urls.is_empty() {
            return Err(anyhow!("no frontend origin configured"));
        }
        self.frontend_urls
            .iter()
            .map(|url| frontend_origin(url))
            .collect()
    }
}

fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend base URL: {frontend_base_url}"))?;
    let host = parsed.host_str().ok_or_else(|| {
        anyhow!("Frontend base URL must include a valid host: {frontend_base_url}")
    })?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}

/// Shared auth state injected into handlers.
pub struct AuthState {
    config: AuthConfig,
    tokens: TokenService,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, tokens: TokenService) -> Self {
        Self { config, tokens }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}
