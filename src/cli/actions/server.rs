use crate::api;
use crate::auth::{state::DEFAULT_SESSION_TTL_SECONDS, AuthConfig, AuthState, TokenService};
use crate::cli::actions::Action;
use crate::store::{MemoryUserStore, PgUserStore, UserStore};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::warn;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            secret,
            frontend_url,
            production,
        } => {
            let config = AuthConfig::new(&frontend_url).with_production(production);
            let tokens = TokenService::new(&secret, DEFAULT_SESSION_TTL_SECONDS);
            let state = Arc::new(AuthState::new(config, tokens));

            let store: Arc<dyn UserStore> = match dsn {
                Some(dsn) => {
                    let pool = PgPoolOptions::new()
                        .min_connections(1)
                        .max_connections(5)
                        .max_lifetime(Duration::from_secs(60 * 2))
                        .test_before_acquire(true)
                        .connect(&dsn)
                        .await
                        .context("Failed to connect to database")?;
                    Arc::new(PgUserStore::new(pool))
                }
                None => {
                    warn!("Using the in-memory user store; data is lost on exit");
                    Arc::new(MemoryUserStore::new())
                }
            };

            api::new(port, state, store).await?;
        }
    }

    Ok(())
}
