//! # Questboard Document Server
//!
//! Serves user documents over HTTP from an in-memory store.
//!
//! ## Usage
//!
//! ```bash
//! API_PORT=8080 cargo run -p questboard-api
//! ```
//!
//! Point the engine at it with `QUESTBOARD_STORE_URL=http://127.0.0.1:8080`.

use questboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use questboard_shared::store::MemoryDocumentStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "questboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Questboard document server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let address = config.bind_address();

    let state = AppState::new(Arc::new(MemoryDocumentStore::new()), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received, exiting...");
        })
        .await?;

    Ok(())
}
