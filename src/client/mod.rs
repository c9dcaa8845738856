//! Server-rendered page support: fetch flags and identity over HTTP.
//!
//! Flow Overview: on each page load the renderer reads the session cookie.
//! No cookie means default flags with no network call. Otherwise the flags
//! endpoint is called with the credential forwarded both ways (cookie and
//! bearer); any transport failure or non-success status falls back to the
//! default flag set. Flag-gated UI must always render something, so this
//! module never surfaces an error to its caller.

use reqwest::{
    header::{AUTHORIZATION, COOKIE, ETAG, IF_NONE_MATCH},
    Client, StatusCode,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::APP_USER_AGENT;
use crate::auth::state::SESSION_COOKIE_NAME;
use crate::flags::FeatureFlags;
use crate::store::PublicUser;

struct CachedFlags {
    etag: String,
    flags: FeatureFlags,
}

pub struct FlagsClient {
    http: Client,
    base_url: String,
    // Last validator and payload, replayed on 304.
    cache: Mutex<Option<CachedFlags>>,
}

impl FlagsClient {
    /// # Errors
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = Client::builder().user_agent(APP_USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: Mutex::new(None),
        })
    }

    /// Fetch the flag set for the given session token. Infallible by
    /// contract: every failure path resolves to the default (all-false) set.
    pub async fn fetch_flags(&self, session_token: Option<&str>) -> FeatureFlags {
        let Some(token) = session_token else {
            // Anonymous pages skip the round trip entirely.
            return FeatureFlags::default();
        };

        let mut request = self
            .http
            .get(format!("{}/api/flags", self.base_url))
            .header(COOKIE, format!("{SESSION_COOKIE_NAME}={token}"))
            .header(AUTHORIZATION, format!("Bearer {token}"));

        {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.as_ref() {
                request = request.header(IF_NONE_MATCH, cached.etag.clone());
            }
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("Flags fetch failed, serving defaults: {err}");
                return FeatureFlags::default();
            }
        };

        if response.status() == StatusCode::NOT_MODIFIED {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.as_ref() {
                debug!("Flags revalidated, serving cached copy");
                return cached.flags;
            }
            return FeatureFlags::default();
        }

        if !response.status().is_success() {
            warn!("Flags endpoint returned {}, serving defaults", response.status());
            return FeatureFlags::default();
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);

        let flags = match response.json::<FeatureFlags>().await {
            Ok(flags) => flags,
            Err(err) => {
                warn!("Flags payload was malformed, serving defaults: {err}");
                return FeatureFlags::default();
            }
        };

        if let Some(etag) = etag {
            let mut cache = self.cache.lock().await;
            *cache = Some(CachedFlags { etag, flags });
        }

        flags
    }

    /// Resolve the current user via `/api/me`. Any failure, including an
    /// expired or invalid token, reads as "not signed in".
    pub async fn fetch_current_user(&self, session_token: Option<&str>) -> Option<PublicUser> {
        let token = session_token?;
        let response = self
            .http
            .get(format!("{}/api/me", self.base_url))
            .header(COOKIE, format!("{SESSION_COOKIE_NAME}={token}"))
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json::<PublicUser>().await.ok()
    }
}
