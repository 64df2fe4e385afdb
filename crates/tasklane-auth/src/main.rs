//! auth-service — the Tasklane authentication HTTP service.
//!
//! Configuration comes from the environment (an optional `.env` file is
//! loaded first): `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`,
//! `DB_PASSWORD`, `SECRET_KEY`, `TOKEN_TTL_MINUTES`, `BIND_ADDR`.

use anyhow::Context;
use tasklane_auth::{AuthState, UserStore, build_router};
use tasklane_core::{ServiceConfig, TokenKeys};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("auth_service=info".parse()?)
                .add_directive("tasklane_auth=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let config = ServiceConfig::from_env().context("invalid service configuration")?;

    let pool = tasklane_core::db::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    let store = UserStore::postgres(pool);
    store.ensure_schema().await.context("failed to create schema")?;

    let state = AuthState {
        store,
        keys: TokenKeys::with_ttl_minutes(&config.secret_key, config.token_ttl_minutes),
        bcrypt_cost: config.bcrypt_cost,
    };
    let router = build_router(state);

    info!(addr = %config.bind_addr, "auth service starting");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
