//! Authentication: registration, login, token issuance, and per-request
//! identity resolution.

pub mod identity;
pub mod service;
pub mod state;
pub mod token;

pub use identity::{require_identity, resolve_identity, Identity};
pub use state::{AuthConfig, AuthState};
pub use token::{TokenError, TokenService};
