//! Stateless session tokens.
//!
//! Tokens are HS256 JWTs carrying the user id and an expiry. They are never
//! persisted or revoked; verification is signature plus expiry only. The
//! algorithm is pinned, so tokens signed with another key or algorithm
//! (including `alg: none`) are rejected as invalid.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Bad signature, malformed structure, wrong algorithm, or a subject
    /// that is not a user id.
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl TokenService {
    /// The signing secret is process-wide configuration; callers load it at
    /// startup and fail fast when it is absent.
    #[must_use]
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Exact expiry, no clock leeway.
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            decoding: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
            ttl_seconds,
        }
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issue a signed token embedding the user id, expiring after the
    /// configured TTL.
    ///
    /// # Errors
    /// Returns an error when signing fails.
    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| anyhow::Error::new(err).context("failed to sign session token"))
    }

    /// Verify signature and expiry, returning the embedded user id.
    ///
    /// # Errors
    /// [`TokenError::Expired`] past expiry, [`TokenError::Invalid`] for
    /// everything else.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn service() -> TokenService {
        TokenService::new(&secret("test-secret-key-long-enough-for-hs256"), 3600)
    }

    #[test]
    fn issue_then_verify_round_trips_user_id() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let expired = TokenService::new(&secret("test-secret-key-long-enough-for-hs256"), -3600);
        let token = expired.issue(Uuid::new_v4()).unwrap();
        let err = service().verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn wrong_key_is_invalid() {
        let other = TokenService::new(&secret("a-completely-different-secret-key"), 3600);
        let token = other.issue(Uuid::new_v4()).unwrap();
        let err = service().verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let err = service().verify("not.a.token").unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }

    #[test]
    fn alg_none_is_rejected() {
        // Hand-rolled unsigned token: {"alg":"none"} header, empty signature.
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let now = Utc::now().timestamp();
        let payload = URL_SAFE_NO_PAD.encode(
            format!(r#"{{"sub":"{}","iat":{now},"exp":{}}}"#, Uuid::new_v4(), now + 3600)
                .as_bytes(),
        );
        let token = format!("{header}.{payload}.");
        let err = service().verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }

    #[test]
    fn subject_must_be_a_user_id() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            iat: now,
            exp: now + 3600,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &tokens.encoding).unwrap();
        let err = tokens.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }
}
