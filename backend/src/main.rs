//! Main entry point for the account backend.
//!
//! This file initializes tracing, loads configuration, sets up the database
//! connection and object store, and serves the API until Ctrl-C.

mod api;
mod auth;
mod config;
mod database;
mod errors;
mod repositories;
mod services;
mod state;
mod utils;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use config::Config;
use database::Database;
use services::object_store::build_object_store;
use state::AppState;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utils::jwt::TokenService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let db = Database::new(&config)
        .await
        .context("Failed to connect to the database")?;
    db.migrate().await.context("Failed to run migrations")?;

    let object_store = build_object_store(&config.storage).context("Failed to build object store")?;

    let state = Arc::new(AppState {
        pool: db.pool().clone(),
        tokens: TokenService::new(&config.auth),
        object_store,
        auth: config.auth.clone(),
        storage: config.storage.clone(),
    });
    let app = api::router(state);

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    info!("Starting account server on port {}", config.server_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
