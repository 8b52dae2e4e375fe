//! # blog-api
//!
//! Assembles the server from compile-time features: PostgreSQL with
//! `db-postgres`, otherwise an in-memory store.

use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tracing::info;

use api_adapters::{router, AppState};
use auth_adapters::{Argon2Hasher, JwtTokenService};
use configs::Settings;
use services::Repositories;

#[cfg(feature = "db-postgres")]
async fn repositories(settings: &Settings) -> anyhow::Result<Repositories> {
    use storage_adapters::PgStore;

    let store = PgStore::connect(
        settings.database.url.expose_secret(),
        settings.database.max_connections,
    )
    .await
    .context("connecting to postgres")?;
    store.migrate().await.context("running migrations")?;

    let store = Arc::new(store);
    Ok(Repositories {
        users: store.clone(),
        posts: store.clone(),
        comments: store,
    })
}

#[cfg(not(feature = "db-postgres"))]
async fn repositories(_settings: &Settings) -> anyhow::Result<Repositories> {
    use storage_adapters::MemoryStore;

    tracing::warn!("built without db-postgres; all data is lost on shutdown");
    let store = Arc::new(MemoryStore::new());
    Ok(Repositories {
        users: store.clone(),
        posts: store.clone(),
        comments: store,
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    settings.log.init();

    let repos = repositories(&settings).await?;
    let tokens = JwtTokenService::new(
        settings.auth.jwt_secret.expose_secret().as_bytes(),
        Duration::minutes(settings.auth.token_ttl_minutes),
    );
    let state = AppState::new(repos, Arc::new(Argon2Hasher::new()), Arc::new(tokens));

    let address = settings.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, "blog api listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
