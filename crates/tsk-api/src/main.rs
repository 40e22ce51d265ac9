//! # tsk-api — Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from the
//! environment:
//!
//! - `PORT` — listen port (default 8080)
//! - `AUTH_TOKEN` — bearer secret; unset disables authentication
//! - `DATABASE_URL` — optional Postgres persistence
//! - `RUST_LOG` — tracing filter (default `info`)

use tsk_api::state::{AppConfig, AppState};
use tsk_rest::phrase::PhraseGenerator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // The process-wide phrase generator behind 500-class correlation
    // phrases is installed here, seeded from OS entropy.
    tsk_api::error::install_phrase_generator(PhraseGenerator::from_entropy());

    // Build configuration from environment.
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let auth_token = std::env::var("AUTH_TOKEN")
        .ok()
        .map(tsk_api::auth::SecretToken::new);
    if auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set — authentication disabled (development mode)");
    }
    let config = AppConfig { port, auth_token };

    // Initialize database pool (optional — absent means in-memory only).
    let db = tsk_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let state = AppState::with_config(config, db);

    // Load persisted records into the in-memory stores.
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        e
    })?;

    let app = tsk_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("TaskStack API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
