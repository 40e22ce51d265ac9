//! # Database Persistence Layer
//!
//! Optional Postgres persistence via SQLx.
//!
//! ## Architecture
//!
//! Persistence is **optional**. When `DATABASE_URL` is set, every record
//! mutation writes through to a single generic `resources` table (gid,
//! resource type, JSONB document, insertion position) and the in-memory
//! stores are hydrated from it at startup. When absent, the API operates
//! in in-memory-only mode — suitable for development and testing.
//!
//! Records are stored as their serde documents, so the table needs no
//! per-resource schema: the relational store's only obligations to the
//! request path are the count/slice reads the in-memory stores already
//! serve.

use sqlx::postgres::{PgPool, PgPoolOptions};
use tsk_core::{Gid, ResourceType};

/// Initialize the connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set — running in-memory only mode. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Insert or replace a record's document.
pub async fn upsert(
    pool: &PgPool,
    resource_type: ResourceType,
    gid: &Gid,
    doc: &serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO resources (gid, resource_type, doc)
         VALUES ($1, $2, $3)
         ON CONFLICT (gid) DO UPDATE SET doc = EXCLUDED.doc",
    )
    .bind(gid.as_str())
    .bind(resource_type.as_str())
    .bind(sqlx::types::Json(doc))
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a record's row. Deleting an absent row is not an error — the
/// in-memory store is the authority on existence.
pub async fn delete(pool: &PgPool, gid: &Gid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM resources WHERE gid = $1")
        .bind(gid.as_str())
        .execute(pool)
        .await?;

    Ok(())
}

/// Load every persisted document of one resource type, in insertion
/// order — the same order the in-memory stores maintain.
pub async fn load_type(
    pool: &PgPool,
    resource_type: ResourceType,
) -> Result<Vec<serde_json::Value>, sqlx::Error> {
    let docs: Vec<sqlx::types::Json<serde_json::Value>> = sqlx::query_scalar(
        "SELECT doc FROM resources WHERE resource_type = $1 ORDER BY position",
    )
    .bind(resource_type.as_str())
    .fetch_all(pool)
    .await?;

    Ok(docs.into_iter().map(|doc| doc.0).collect())
}
