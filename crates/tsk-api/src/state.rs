//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! Each resource kind lives in its own insertion-ordered in-memory
//! [`Store`]. The stores are the ordered collections the paginator pages
//! over; insertion order is the collection order, so repeated reads of an
//! unmodified store return identical pages.
//!
//! When a database pool is configured, mutations write through to the
//! generic `resources` table and the stores are hydrated from it at
//! startup. Without a pool the server is in-memory only.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use tsk_core::{Gid, Resource, ResourceType};
use tsk_rest::pagination::OrderedCollection;

use crate::auth::SecretToken;
use crate::error::AppError;

// ── Generic in-memory store ─────────────────────────────────────────────────

/// Thread-safe, cloneable, insertion-ordered in-memory collection.
///
/// The lock is `parking_lot`, not `tokio::sync`, because it is never held
/// across an `.await` point; a panicking writer cannot poison it.
#[derive(Debug)]
pub struct Store<T: Clone> {
    data: Arc<RwLock<Vec<T>>>,
}

impl<T: Clone> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Resource> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Insert a record. A record with the same gid is replaced in place,
    /// keeping its position in the collection order.
    pub fn insert(&self, value: T) {
        let mut guard = self.data.write();
        match guard.iter_mut().find(|item| item.gid() == value.gid()) {
            Some(slot) => *slot = value,
            None => guard.push(value),
        }
    }

    /// Retrieve a record by gid.
    pub fn get(&self, gid: &Gid) -> Option<T> {
        self.data.read().iter().find(|item| item.gid() == gid).cloned()
    }

    /// Update a record in place. Returns the updated record, or `None`
    /// if no record has that gid.
    pub fn update(&self, gid: &Gid, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        let slot = guard.iter_mut().find(|item| item.gid() == gid)?;
        f(slot);
        Some(slot.clone())
    }

    /// Remove a record by gid, returning it.
    pub fn remove(&self, gid: &Gid) -> Option<T> {
        let mut guard = self.data.write();
        let index = guard.iter().position(|item| item.gid() == gid)?;
        Some(guard.remove(index))
    }

    /// All records, in collection order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().clone()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Resource> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The paginator's view of a store: two reads, no transaction. A writer
/// racing between them can shift a page boundary; that window is part of
/// the documented consistency contract, not a defect here.
impl<T: Clone + Resource + Send + Sync> OrderedCollection for Store<T> {
    type Item = T;
    type Error = std::convert::Infallible;

    async fn count(&self) -> Result<usize, Self::Error> {
        Ok(self.data.read().len())
    }

    async fn slice(&self, offset: usize, limit: usize) -> Result<Vec<T>, Self::Error> {
        Ok(self
            .data
            .read()
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

// ── Record types ────────────────────────────────────────────────────────────

/// Render a timestamp the way the wire contract expects:
/// RFC 3339 with millisecond precision and `Z` suffix.
pub fn wire_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Workspace record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceRecord {
    pub gid: Gid,
    pub name: String,
    pub email_domains: Vec<String>,
    pub is_organization: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Resource for WorkspaceRecord {
    const TYPE: ResourceType = ResourceType::Workspace;

    fn gid(&self) -> &Gid {
        &self.gid
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// User record. `workspaces` holds the gids of workspaces the user
/// belongs to; full renderings resolve them to compact documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub gid: Gid,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub workspaces: Vec<Gid>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Resource for UserRecord {
    const TYPE: ResourceType = ResourceType::User;

    fn gid(&self) -> &Gid {
        &self.gid
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Project record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub gid: Gid,
    pub name: String,
    pub archived: bool,
    pub color: Option<String>,
    pub notes: String,
    pub public: bool,
    pub due_on: Option<NaiveDate>,
    pub workspace: Gid,
    pub members: Vec<Gid>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Resource for ProjectRecord {
    const TYPE: ResourceType = ResourceType::Project;

    fn gid(&self) -> &Gid {
        &self.gid
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Task record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub gid: Gid,
    pub name: String,
    pub notes: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub due_on: Option<NaiveDate>,
    pub assignee: Option<Gid>,
    pub projects: Vec<Gid>,
    pub workspace: Gid,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Resource for TaskRecord {
    const TYPE: ResourceType = ResourceType::Task;

    fn gid(&self) -> &Gid {
        &self.gid
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ── App config & state ──────────────────────────────────────────────────────

/// Server configuration assembled from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub auth_token: Option<SecretToken>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
        }
    }
}

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub workspaces: Store<WorkspaceRecord>,
    pub users: Store<UserRecord>,
    pub projects: Store<ProjectRecord>,
    pub tasks: Store<TaskRecord>,
    pub db: Option<PgPool>,
}

impl AppState {
    /// In-memory state with default configuration (auth disabled).
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// State with explicit configuration and an optional database pool.
    pub fn with_config(config: AppConfig, db: Option<PgPool>) -> Self {
        Self {
            config,
            workspaces: Store::new(),
            users: Store::new(),
            projects: Store::new(),
            tasks: Store::new(),
            db,
        }
    }

    /// Write a record through to the database, when one is configured.
    ///
    /// A persist failure is surfaced to the client: the in-memory record
    /// would be lost on restart, so pretending the write succeeded would
    /// be silent data loss.
    pub async fn persist<T: Resource + Serialize>(&self, record: &T) -> Result<(), AppError> {
        let Some(pool) = &self.db else {
            return Ok(());
        };
        let doc = serde_json::to_value(record).map_err(|e| {
            AppError::Internal(format!("failed to serialize {} record: {e}", T::TYPE))
        })?;
        crate::db::upsert(pool, T::TYPE, record.gid(), &doc)
            .await
            .map_err(|e| {
                tracing::error!(gid = %record.gid(), error = %e, "write-through persist failed");
                AppError::Internal(
                    "record stored in memory but database persist failed".to_string(),
                )
            })
    }

    /// Remove a record's row from the database, when one is configured.
    pub async fn unpersist(&self, gid: &Gid) -> Result<(), AppError> {
        let Some(pool) = &self.db else {
            return Ok(());
        };
        crate::db::delete(pool, gid).await.map_err(|e| {
            tracing::error!(gid = %gid, error = %e, "write-through delete failed");
            AppError::Internal("record removed from memory but database delete failed".to_string())
        })
    }

    /// Load every persisted record into the in-memory stores.
    ///
    /// Rows that no longer deserialize are skipped with a warning rather
    /// than aborting startup.
    pub async fn hydrate_from_db(&self) -> Result<(), sqlx::Error> {
        let Some(pool) = &self.db else {
            return Ok(());
        };

        hydrate_store(pool, &self.workspaces).await?;
        hydrate_store(pool, &self.users).await?;
        hydrate_store(pool, &self.projects).await?;
        hydrate_store(pool, &self.tasks).await?;

        tracing::info!(
            workspaces = self.workspaces.len(),
            users = self.users.len(),
            projects = self.projects.len(),
            tasks = self.tasks.len(),
            "hydrated stores from database"
        );
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

async fn hydrate_store<T>(pool: &PgPool, store: &Store<T>) -> Result<(), sqlx::Error>
where
    T: Clone + Resource + for<'de> Deserialize<'de>,
{
    for doc in crate::db::load_type(pool, T::TYPE).await? {
        match serde_json::from_value::<T>(doc) {
            Ok(record) => store.insert(record),
            Err(e) => {
                tracing::warn!(resource_type = %T::TYPE, error = %e, "skipping undecodable persisted record");
            }
        }
    }
    Ok(())
}

/// Resolve a gid against a store, rendering the compact document or JSON
/// null. Shared by every full-record renderer that embeds a reference.
pub fn compact_or_null<T: Clone + Resource>(store: &Store<T>, gid: &Gid) -> Value {
    match store.get(gid) {
        Some(record) => Value::Object(record.compact()),
        None => Value::Null,
    }
}

/// Resolve a list of gids to the compact documents that still exist.
pub fn compact_list<T: Clone + Resource>(store: &Store<T>, gids: &[Gid]) -> Vec<Value> {
    gids.iter()
        .filter_map(|gid| store.get(gid).map(|record| Value::Object(record.compact())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace(gid: &str, name: &str) -> WorkspaceRecord {
        let now = Utc::now();
        WorkspaceRecord {
            gid: Gid::from_string(gid),
            name: name.to_string(),
            email_domains: Vec::new(),
            is_organization: false,
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn store_preserves_insertion_order() {
        let store: Store<WorkspaceRecord> = Store::new();
        store.insert(workspace("w-1", "One"));
        store.insert(workspace("w-2", "Two"));
        store.insert(workspace("w-3", "Three"));
        let names: Vec<String> = store.list().into_iter().map(|w| w.name).collect();
        assert_eq!(names, ["One", "Two", "Three"]);
    }

    #[test]
    fn insert_same_gid_replaces_in_place() {
        let store: Store<WorkspaceRecord> = Store::new();
        store.insert(workspace("w-1", "One"));
        store.insert(workspace("w-2", "Two"));
        store.insert(workspace("w-1", "One, renamed"));
        assert_eq!(store.len(), 2);
        let names: Vec<String> = store.list().into_iter().map(|w| w.name).collect();
        assert_eq!(names, ["One, renamed", "Two"]);
    }

    #[test]
    fn get_update_remove_round_trip() {
        let store: Store<WorkspaceRecord> = Store::new();
        store.insert(workspace("w-1", "One"));

        assert!(store.get(&Gid::from_string("w-1")).is_some());
        assert!(store.get(&Gid::from_string("nope")).is_none());

        let updated = store.update(&Gid::from_string("w-1"), |w| {
            w.name = "Renamed".to_string();
        });
        assert_eq!(updated.map(|w| w.name).as_deref(), Some("Renamed"));

        assert!(store.remove(&Gid::from_string("w-1")).is_some());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn store_count_and_slice_follow_order() {
        let store: Store<WorkspaceRecord> = Store::new();
        for i in 0..5 {
            store.insert(workspace(&format!("w-{i}"), &format!("W{i}")));
        }
        assert_eq!(store.count().await, Ok(5));
        let slice = store.slice(1, 2).await.unwrap();
        let names: Vec<String> = slice.into_iter().map(|w| w.name).collect();
        assert_eq!(names, ["W1", "W2"]);
    }

    #[tokio::test]
    async fn store_slice_past_end_is_shorter() {
        let store: Store<WorkspaceRecord> = Store::new();
        store.insert(workspace("w-1", "One"));
        let slice = store.slice(0, 10).await.unwrap();
        assert_eq!(slice.len(), 1);
    }

    #[test]
    fn compact_or_null_resolves_and_degrades() {
        let store: Store<WorkspaceRecord> = Store::new();
        store.insert(workspace("w-1", "One"));

        let resolved = compact_or_null(&store, &Gid::from_string("w-1"));
        assert_eq!(resolved["name"], serde_json::json!("One"));

        let missing = compact_or_null(&store, &Gid::from_string("gone"));
        assert!(missing.is_null());
    }

    #[test]
    fn compact_list_drops_dangling_gids() {
        let store: Store<WorkspaceRecord> = Store::new();
        store.insert(workspace("w-1", "One"));
        let list = compact_list(
            &store,
            &[Gid::from_string("w-1"), Gid::from_string("dangling")],
        );
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn wire_timestamp_format() {
        let at = DateTime::parse_from_rfc3339("2026-02-03T04:05:06.789Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(wire_timestamp(at), "2026-02-03T04:05:06.789Z");
    }

    #[test]
    fn record_serde_round_trip() {
        let record = workspace("w-1", "One");
        let value = serde_json::to_value(&record).unwrap();
        let back: WorkspaceRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.gid, record.gid);
        assert_eq!(back.name, record.name);
    }
}
