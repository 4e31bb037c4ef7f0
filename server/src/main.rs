// Forbid unwrap() in production code to prevent panics on bad input.
// Test code is allowed to use unwrap() for convenience.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::sync::Arc;

use intranet_server::{
    AppState, build_router,
    config::ServerConfig,
    time::SystemTimeSource,
    users::InMemoryUserRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intranet_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables.
    // Misconfiguration is the only condition that stops startup.
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: listen_addr={}, token_ttl={}s, hash_cost={:?}, hash_concurrency={}",
        config.listen_addr,
        config.token_ttl.as_secs(),
        config.hash_cost,
        config.hash_concurrency
    );

    let state = match AppState::from_config(
        &config,
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(SystemTimeSource),
    ) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize services: {e}");
            std::process::exit(1);
        }
    };

    if let Some(admin) = config.bootstrap_admin.clone()
        && let Err(e) = state.users.seed_admin(admin.email, admin.password).await
    {
        tracing::error!("Failed to create bootstrap admin: {e}");
        std::process::exit(1);
    }

    let app = build_router(state);

    tracing::info!("listening on {}", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
