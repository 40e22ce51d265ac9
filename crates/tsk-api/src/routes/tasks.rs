//! # Tasks API
//!
//! ## Endpoints
//!
//! - `GET /tasks` — list tasks (compact), paginated
//! - `POST /tasks` — create task
//! - `GET /tasks/:task_gid` — full task record
//! - `PUT /tasks/:task_gid` — partial update
//! - `DELETE /tasks/:task_gid` — delete; body `{"data": {}}`
//!
//! Required scope: `tasks:read` (writes also accept `tasks:write`).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tsk_core::{document, Document, Gid, Resource};
use tsk_rest::envelope::{CollectionEnvelope, DataEnvelope, ValidationIssue};
use tsk_rest::pagination::paginate;
use utoipa::ToSchema;

use crate::auth::{require_scopes, Principal};
use crate::error::AppError;
use crate::extractors::{
    extract_data, OptFields, PageQuery, RequestUrl, Validate, ValidationIssues,
};
use crate::state::{compact_list, compact_or_null, wire_timestamp, AppState, TaskRecord};

const READ_SCOPES: &[&str] = &["tasks:read"];
const WRITE_SCOPES: &[&str] = &["tasks:read", "tasks:write"];

// ── Request DTOs ────────────────────────────────────────────────────────────

/// Request to create a task.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateTaskRequest {
    pub name: Option<String>,
    /// Workspace gid. Either this or `projects` must be given.
    pub workspace: Option<String>,
    /// Project gids the task starts in.
    pub projects: Vec<String>,
    /// Assignee user gid. Unknown gids are ignored.
    pub assignee: Option<String>,
    pub notes: Option<String>,
    pub due_on: Option<NaiveDate>,
}

impl Validate for CreateTaskRequest {
    fn validate(&self) -> Result<(), ValidationIssues> {
        let mut issues = Vec::new();
        if !self.name.as_deref().is_some_and(|n| !n.trim().is_empty()) {
            issues.push(ValidationIssue::field("name", "This field is required."));
        }
        if self.workspace.is_none() && self.projects.is_empty() {
            issues.push(ValidationIssue::message("Workspace or project is required"));
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

/// Request to update a task. Absent fields stay untouched; `assignee`
/// and `due_on` distinguish absent from explicit `null` (which clears).
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateTaskRequest {
    pub name: Option<String>,
    pub notes: Option<String>,
    pub completed: Option<bool>,
    #[serde(deserialize_with = "crate::extractors::double_option")]
    #[schema(value_type = Option<String>)]
    pub due_on: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "crate::extractors::double_option")]
    #[schema(value_type = Option<String>)]
    pub assignee: Option<Option<String>>,
}

impl Validate for UpdateTaskRequest {
    fn validate(&self) -> Result<(), ValidationIssues> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(vec![ValidationIssue::field(
                "name",
                "May not be blank if provided.",
            )]);
        }
        Ok(())
    }
}

// ── Serialization ───────────────────────────────────────────────────────────

/// Full task document, resolving cross-resource references to compact
/// documents against the live stores.
fn full_task(task: &TaskRecord, state: &AppState) -> Document {
    let assignee = task
        .assignee
        .as_ref()
        .map(|gid| compact_or_null(&state.users, gid))
        .unwrap_or(Value::Null);

    document::from_value(json!({
        "gid": task.gid.as_str(),
        "resource_type": "task",
        "name": task.name,
        "notes": task.notes,
        "completed": task.completed,
        "completed_at": task.completed_at.map(wire_timestamp),
        "due_on": task.due_on,
        "assignee": assignee,
        "projects": compact_list(&state.projects, &task.projects),
        "workspace": compact_or_null(&state.workspaces, &task.workspace),
        "created_at": wire_timestamp(task.created_at),
        "modified_at": wire_timestamp(task.modified_at),
    }))
}

// ── Router ──────────────────────────────────────────────────────────────────

/// Build the tasks router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:task_gid",
            get(get_task).put(update_task).delete(delete_task),
        )
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// GET /tasks — compact records for all tasks, paginated.
#[utoipa::path(
    get,
    path = "/tasks",
    params(
        ("limit" = Option<String>, Query, description = "Page size, 1-100 (default 50)"),
        ("offset" = Option<String>, Query, description = "Offset token from a previous next_page"),
        ("opt_fields" = Option<String>, Query, description = "Comma-separated field paths to project"),
    ),
    responses(
        (status = 200, description = "Paginated compact task records"),
        (status = 403, description = "Insufficient scope"),
    ),
    tag = "tasks"
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    principal: Principal,
    page: PageQuery,
    fields: OptFields,
    url: RequestUrl,
) -> Result<Json<CollectionEnvelope<Document>>, AppError> {
    require_scopes(&principal, READ_SCOPES)?;
    let page = paginate(&state.tasks, page.window()).await?;
    let page = page.map(|task| fields.apply(&task.compact()));
    Ok(Json(CollectionEnvelope::from_page(page, url.as_url())))
}

/// POST /tasks — create a task.
#[utoipa::path(
    post,
    path = "/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created"),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Referenced workspace or project not found"),
    ),
    tag = "tasks"
)]
pub async fn create_task(
    State(state): State<AppState>,
    principal: Principal,
    fields: OptFields,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<DataEnvelope<Document>>), AppError> {
    require_scopes(&principal, WRITE_SCOPES)?;
    let req: CreateTaskRequest = extract_data(body)?;

    // Resolve the owning workspace: named directly, or through the first
    // named project. The reference must exist; the 404 carries the label
    // of whichever lookup failed.
    let workspace = match &req.workspace {
        Some(raw) => state
            .workspaces
            .get(&Gid::from(raw.as_str()))
            .ok_or_else(|| AppError::not_found("Workspace"))?,
        None => {
            let first = req
                .projects
                .first()
                .ok_or_else(|| AppError::invalid("Workspace or project is required"))?;
            let project = state
                .projects
                .get(&Gid::from(first.as_str()))
                .ok_or_else(|| AppError::not_found("Project"))?;
            state
                .workspaces
                .get(&project.workspace)
                .ok_or_else(|| AppError::not_found("Workspace"))?
        }
    };

    // Unknown assignee and project gids are ignored rather than rejected.
    let assignee = req
        .assignee
        .as_deref()
        .map(Gid::from)
        .filter(|gid| state.users.get(gid).is_some());
    let projects: Vec<Gid> = req
        .projects
        .iter()
        .map(|raw| Gid::from(raw.as_str()))
        .filter(|gid| state.projects.get(gid).is_some())
        .collect();

    let now = Utc::now();
    let record = TaskRecord {
        gid: Gid::new(),
        name: req.name.unwrap_or_default(),
        notes: req.notes.unwrap_or_default(),
        completed: false,
        completed_at: None,
        due_on: req.due_on,
        assignee,
        projects,
        workspace: workspace.gid.clone(),
        created_at: now,
        modified_at: now,
    };

    state.tasks.insert(record.clone());
    state.persist(&record).await?;

    let doc = fields.apply(&full_task(&record, &state));
    Ok((StatusCode::CREATED, Json(DataEnvelope::new(doc))))
}

/// GET /tasks/:task_gid — the complete record for a single task.
#[utoipa::path(
    get,
    path = "/tasks/{task_gid}",
    params(("task_gid" = String, Path, description = "Task gid")),
    responses(
        (status = 200, description = "Full task record"),
        (status = 404, description = "Task not found"),
    ),
    tag = "tasks"
)]
pub async fn get_task(
    State(state): State<AppState>,
    principal: Principal,
    Path(task_gid): Path<String>,
    fields: OptFields,
) -> Result<Json<DataEnvelope<Document>>, AppError> {
    require_scopes(&principal, READ_SCOPES)?;
    let task = state
        .tasks
        .get(&Gid::from(task_gid.as_str()))
        .ok_or_else(|| AppError::not_found("Task"))?;
    Ok(Json(DataEnvelope::new(fields.apply(&full_task(&task, &state)))))
}

/// PUT /tasks/:task_gid — update the provided fields of a task.
#[utoipa::path(
    put,
    path = "/tasks/{task_gid}",
    params(("task_gid" = String, Path, description = "Task gid")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Updated full task record"),
        (status = 404, description = "Task not found"),
    ),
    tag = "tasks"
)]
pub async fn update_task(
    State(state): State<AppState>,
    principal: Principal,
    Path(task_gid): Path<String>,
    fields: OptFields,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DataEnvelope<Document>>, AppError> {
    require_scopes(&principal, WRITE_SCOPES)?;
    let req: UpdateTaskRequest = extract_data(body)?;

    let updated = state
        .tasks
        .update(&Gid::from(task_gid.as_str()), |task| {
            if let Some(name) = &req.name {
                task.name = name.clone();
            }
            if let Some(notes) = &req.notes {
                task.notes = notes.clone();
            }
            if let Some(completed) = req.completed {
                task.completed = completed;
                if completed {
                    task.completed_at = Some(Utc::now());
                }
            }
            if let Some(due_on) = req.due_on {
                task.due_on = due_on;
            }
            if let Some(assignee) = &req.assignee {
                match assignee {
                    // Unknown assignee gids leave the current assignee.
                    Some(raw) => {
                        let gid = Gid::from(raw.as_str());
                        if state.users.get(&gid).is_some() {
                            task.assignee = Some(gid);
                        }
                    }
                    None => task.assignee = None,
                }
            }
            task.modified_at = Utc::now();
        })
        .ok_or_else(|| AppError::not_found("Task"))?;

    state.persist(&updated).await?;
    Ok(Json(DataEnvelope::new(
        fields.apply(&full_task(&updated, &state)),
    )))
}

/// DELETE /tasks/:task_gid — delete a task. Success body is `{"data": {}}`.
#[utoipa::path(
    delete,
    path = "/tasks/{task_gid}",
    params(("task_gid" = String, Path, description = "Task gid")),
    responses(
        (status = 200, description = "Task deleted; empty data record"),
        (status = 404, description = "Task not found"),
    ),
    tag = "tasks"
)]
pub async fn delete_task(
    State(state): State<AppState>,
    principal: Principal,
    Path(task_gid): Path<String>,
) -> Result<Json<DataEnvelope<Document>>, AppError> {
    require_scopes(&principal, WRITE_SCOPES)?;
    let gid = Gid::from(task_gid.as_str());
    state
        .tasks
        .remove(&gid)
        .ok_or_else(|| AppError::not_found("Task"))?;
    state.unpersist(&gid).await?;
    Ok(Json(DataEnvelope::new(Document::new())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorkspaceRecord;

    fn seeded_state() -> AppState {
        let state = AppState::new();
        let now = Utc::now();
        state.workspaces.insert(WorkspaceRecord {
            gid: Gid::from_string("w-1"),
            name: "Marketing".to_string(),
            email_domains: Vec::new(),
            is_organization: false,
            created_at: now,
            modified_at: now,
        });
        state
    }

    fn task(state: &AppState) -> TaskRecord {
        let now = Utc::now();
        TaskRecord {
            gid: Gid::from_string("t-1"),
            name: "Draft launch email".to_string(),
            notes: String::new(),
            completed: false,
            completed_at: None,
            due_on: None,
            assignee: Some(Gid::from_string("missing-user")),
            projects: vec![Gid::from_string("p-gone")],
            workspace: state
                .workspaces
                .list()
                .first()
                .map(|w| w.gid.clone())
                .unwrap_or_default(),
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn create_request_requires_name_and_container() {
        let req = CreateTaskRequest::default();
        let issues = req.validate().unwrap_err();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].field.as_deref(), Some("name"));
        assert!(issues[1].field.is_none());
    }

    #[test]
    fn create_request_with_project_only_is_valid() {
        let req = CreateTaskRequest {
            name: Some("x".to_string()),
            projects: vec!["p-1".to_string()],
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn update_request_distinguishes_absent_from_null() {
        let absent: UpdateTaskRequest = serde_json::from_value(json!({})).unwrap();
        assert!(absent.assignee.is_none());

        let cleared: UpdateTaskRequest = serde_json::from_value(json!({"assignee": null})).unwrap();
        assert_eq!(cleared.assignee, Some(None));

        let set: UpdateTaskRequest = serde_json::from_value(json!({"assignee": "u-1"})).unwrap();
        assert_eq!(set.assignee, Some(Some("u-1".to_string())));
    }

    #[test]
    fn full_task_embeds_workspace_and_nulls_dangling_refs() {
        let state = seeded_state();
        let doc = full_task(&task(&state), &state);

        assert_eq!(doc["workspace"]["name"], json!("Marketing"));
        // Dangling assignee resolves to null; dangling projects drop out.
        assert_eq!(doc["assignee"], json!(null));
        assert_eq!(doc["projects"], json!([]));
        assert_eq!(doc["completed_at"], json!(null));
    }

    #[test]
    fn full_task_timestamps_use_wire_format() {
        let state = seeded_state();
        let doc = full_task(&task(&state), &state);
        let created = doc["created_at"].as_str().unwrap();
        assert!(created.ends_with('Z'));
    }
}
