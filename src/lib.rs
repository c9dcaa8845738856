//! Role-gated feature flags behind stateless session auth.
//!
//! The server issues signed session tokens at login, resolves them on every
//! request (bearer header first, then cookie), and serves a boolean capability
//! set derived from the user's role. The client module fetches those flags
//! with a fall-back-to-defaults contract so flag-gated UI always renders.

pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod flags;
pub mod store;
