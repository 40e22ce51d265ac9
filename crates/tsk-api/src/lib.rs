//! # tsk-api — Axum API Service for TaskStack
//!
//! Asana-compatible CRUD endpoints for the mirrored resource model,
//! assembled on top of the generic resource-access layer in `tsk-rest`.
//!
//! ## API Surface
//!
//! | Prefix            | Module                  | Notes                      |
//! |-------------------|-------------------------|----------------------------|
//! | `/workspaces/*`   | [`routes::workspaces`]  | list / get / rename        |
//! | `/users/*`        | [`routes::users`]       | read-only                  |
//! | `/projects/*`     | [`routes::projects`]    | full CRUD                  |
//! | `/tasks/*`        | [`routes::tasks`]       | full CRUD                  |
//! | `/openapi.json`   | [`openapi`]             | generated spec             |
//! | `/health/*`       | here                    | unauthenticated probes     |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```
//!
//! Authentication yields a [`auth::Principal`]; each handler then checks
//! its declared required scopes before touching a store. Every response
//! body is an envelope: `{"data": ...}` on success, `{"errors": [...]}`
//! on failure.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

pub use error::AppError;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware so
/// orchestrators can reach them without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::workspaces::router())
        .merge(routes::users::router())
        .merge(routes::projects::router())
        .merge(routes::tasks::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// Liveness probe — 200 whenever the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the stores are reachable and, when a
/// database is configured, that it answers a trivial query.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    // Read locks must be acquirable; a poisoned-equivalent deadlock would
    // hang here rather than serve broken traffic.
    let _ = state.workspaces.len();
    let _ = state.users.len();
    let _ = state.projects.len();
    let _ = state.tasks.len();

    if let Some(pool) = &state.db {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "database health check failed");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}
