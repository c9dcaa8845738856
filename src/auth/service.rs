//! Registration and login.
//!
//! Registration validates, hashes with bcrypt, and persists; uniqueness is
//! left to the store. Login keeps "unknown email" and "wrong password"
//! indistinguishable to the caller.

use regex::Regex;
use tracing::{debug, instrument};

use crate::api::error::ApiError;
use crate::flags::Role;
use crate::store::{PublicUser, StoreError, UserStore};

/// Matches the original deployment's hashes.
const BCRYPT_COST: u32 = 12;

const MIN_PASSWORD_LENGTH: usize = 6;

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Register a new user, returning the public projection.
///
/// # Errors
/// `Validation` for malformed email or short password, `Conflict` when the
/// email is taken, `Internal` for hashing or store failures.
#[instrument(skip_all, fields(email = %normalize_email(email)))]
pub async fn register(
    store: &dyn UserStore,
    email: &str,
    password: &str,
    role: Role,
) -> Result<PublicUser, ApiError> {
    let email = normalize_email(email);
    if !valid_email(&email) {
        return Err(ApiError::validation(
            "Invalid email",
            "Please enter a valid email address",
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation(
            "Password too short",
            "Password must be at least 6 characters long",
        ));
    }

    let password_hash = bcrypt::hash(password, BCRYPT_COST)
        .map_err(|err| ApiError::Internal(anyhow::Error::new(err).context("bcrypt hash failed")))?;

    match store.insert_user(&email, &password_hash, role).await {
        Ok(user) => {
            debug!("Registered {} as {}", user.email, user.role);
            Ok(PublicUser::from(&user))
        }
        Err(StoreError::DuplicateEmail) => Err(ApiError::conflict(
            "User already exists",
            "User with this email is already registered. Try logging in or use a different email.",
        )),
        Err(StoreError::Backend(err)) => Err(ApiError::Internal(err)),
    }
}

/// Verify credentials, returning the public projection.
///
/// # Errors
/// `Authentication` when the email is unknown or the password does not
/// match, `Internal` for store or hash-comparison failures.
#[instrument(skip_all, fields(email = %normalize_email(email)))]
pub async fn login(
    store: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<PublicUser, ApiError> {
    let email = normalize_email(email);
    let Some(user) = store
        .find_by_email(&email)
        .await
        .map_err(|err| ApiError::Internal(anyhow::Error::new(err)))?
    else {
        return Err(ApiError::Authentication);
    };

    let matches = bcrypt::verify(password, &user.password_hash).map_err(|err| {
        ApiError::Internal(anyhow::Error::new(err).context("bcrypt verify failed"))
    })?;
    if !matches {
        return Err(ApiError::Authentication);
    }

    Ok(PublicUser::from(&user))
}
