//! # Projects API
//!
//! ## Endpoints
//!
//! - `GET /projects` — list projects (compact), paginated
//! - `POST /projects` — create project
//! - `GET /projects/:project_gid` — full project record
//! - `PUT /projects/:project_gid` — partial update
//! - `DELETE /projects/:project_gid` — delete; body `{"data": {}}`
//!
//! Required scope: `projects:read` (writes also accept `projects:write`).

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
use crate::state::{compact_list, compact_or_null, wire_timestamp, AppState, ProjectRecord};

const READ_SCOPES: &[&str] = &["projects:read"];
const WRITE_SCOPES: &[&str] = &["projects:read", "projects:write"];

// ── Request DTOs ────────────────────────────────────────────────────────────

/// Request to create a project.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    /// Workspace gid the project lives in.
    pub workspace: Option<String>,
    pub notes: Option<String>,
    pub color: Option<String>,
    pub public: Option<bool>,
    pub due_on: Option<NaiveDate>,
}

impl Validate for CreateProjectRequest {
    fn validate(&self) -> Result<(), ValidationIssues> {
        let mut issues = Vec::new();
        if !self.name.as_deref().is_some_and(|n| !n.trim().is_empty()) {
            issues.push(ValidationIssue::field("name", "This field is required."));
        }
        if self.workspace.is_none() {
            issues.push(ValidationIssue::field("workspace", "This field is required."));
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

/// Request to update a project. Absent fields stay untouched; `due_on`
/// distinguishes absent from explicit `null` (which clears).
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub notes: Option<String>,
    pub color: Option<String>,
    pub archived: Option<bool>,
    pub public: Option<bool>,
    #[serde(deserialize_with = "crate::extractors::double_option")]
    #[schema(value_type = Option<String>)]
    pub due_on: Option<Option<NaiveDate>>,
}

impl Validate for UpdateProjectRequest {
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

/// Full project document, resolving the workspace and member references.
fn full_project(project: &ProjectRecord, state: &AppState) -> Document {
    document::from_value(json!({
        "gid": project.gid.as_str(),
        "resource_type": "project",
        "name": project.name,
        "archived": project.archived,
        "color": project.color,
        "notes": project.notes,
        "public": project.public,
        "due_on": project.due_on,
        "workspace": compact_or_null(&state.workspaces, &project.workspace),
        "members": compact_list(&state.users, &project.members),
        "created_at": wire_timestamp(project.created_at),
        "modified_at": wire_timestamp(project.modified_at),
    }))
}

// ── Router ──────────────────────────────────────────────────────────────────

/// Build the projects router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:project_gid",
            get(get_project).put(update_project).delete(delete_project),
        )
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// GET /projects — compact records for all projects, paginated.
#[utoipa::path(
    get,
    path = "/projects",
    params(
        ("limit" = Option<String>, Query, description = "Page size, 1-100 (default 50)"),
        ("offset" = Option<String>, Query, description = "Offset token from a previous next_page"),
        ("opt_fields" = Option<String>, Query, description = "Comma-separated field paths to project"),
    ),
    responses(
        (status = 200, description = "Paginated compact project records"),
    ),
    tag = "projects"
)]
pub async fn list_projects(
    State(state): State<AppState>,
    principal: Principal,
    page: PageQuery,
    fields: OptFields,
    url: RequestUrl,
) -> Result<Json<CollectionEnvelope<Document>>, AppError> {
    require_scopes(&principal, READ_SCOPES)?;
    let page = paginate(&state.projects, page.window()).await?;
    let page = page.map(|project| fields.apply(&project.compact()));
    Ok(Json(CollectionEnvelope::from_page(page, url.as_url())))
}

/// POST /projects — create a project.
#[utoipa::path(
    post,
    path = "/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created"),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Referenced workspace not found"),
    ),
    tag = "projects"
)]
pub async fn create_project(
    State(state): State<AppState>,
    principal: Principal,
    fields: OptFields,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<DataEnvelope<Document>>), AppError> {
    require_scopes(&principal, WRITE_SCOPES)?;
    let req: CreateProjectRequest = extract_data(body)?;

    let workspace_gid = req
        .workspace
        .as_deref()
        .map(Gid::from)
        .ok_or_else(|| AppError::invalid_field("workspace", "This field is required."))?;
    let workspace = state
        .workspaces
        .get(&workspace_gid)
        .ok_or_else(|| AppError::not_found("Workspace"))?;

    let now = Utc::now();
    let record = ProjectRecord {
        gid: Gid::new(),
        name: req.name.unwrap_or_default(),
        archived: false,
        color: req.color,
        notes: req.notes.unwrap_or_default(),
        public: req.public.unwrap_or(false),
        due_on: req.due_on,
        workspace: workspace.gid.clone(),
        members: Vec::new(),
        created_at: now,
        modified_at: now,
    };

    state.projects.insert(record.clone());
    state.persist(&record).await?;

    let doc = fields.apply(&full_project(&record, &state));
    Ok((StatusCode::CREATED, Json(DataEnvelope::new(doc))))
}

/// GET /projects/:project_gid — the complete record for a single project.
#[utoipa::path(
    get,
    path = "/projects/{project_gid}",
    params(("project_gid" = String, Path, description = "Project gid")),
    responses(
        (status = 200, description = "Full project record"),
        (status = 404, description = "Project not found"),
    ),
    tag = "projects"
)]
pub async fn get_project(
    State(state): State<AppState>,
    principal: Principal,
    Path(project_gid): Path<String>,
    fields: OptFields,
) -> Result<Json<DataEnvelope<Document>>, AppError> {
    require_scopes(&principal, READ_SCOPES)?;
    let project = state
        .projects
        .get(&Gid::from(project_gid.as_str()))
        .ok_or_else(|| AppError::not_found("Project"))?;
    Ok(Json(DataEnvelope::new(
        fields.apply(&full_project(&project, &state)),
    )))
}

/// PUT /projects/:project_gid — update the provided fields of a project.
#[utoipa::path(
    put,
    path = "/projects/{project_gid}",
    params(("project_gid" = String, Path, description = "Project gid")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Updated full project record"),
        (status = 404, description = "Project not found"),
    ),
    tag = "projects"
)]
pub async fn update_project(
    State(state): State<AppState>,
    principal: Principal,
    Path(project_gid): Path<String>,
    fields: OptFields,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DataEnvelope<Document>>, AppError> {
    require_scopes(&principal, WRITE_SCOPES)?;
    let req: UpdateProjectRequest = extract_data(body)?;

    let updated = state
        .projects
        .update(&Gid::from(project_gid.as_str()), |project| {
            if let Some(name) = &req.name {
                project.name = name.clone();
            }
            if let Some(notes) = &req.notes {
                project.notes = notes.clone();
            }
            if let Some(color) = &req.color {
                project.color = Some(color.clone());
            }
            if let Some(archived) = req.archived {
                project.archived = archived;
            }
            if let Some(public) = req.public {
                project.public = public;
            }
            if let Some(due_on) = req.due_on {
                project.due_on = due_on;
            }
            project.modified_at = Utc::now();
        })
        .ok_or_else(|| AppError::not_found("Project"))?;

    state.persist(&updated).await?;
    Ok(Json(DataEnvelope::new(
        fields.apply(&full_project(&updated, &state)),
    )))
}

/// DELETE /projects/:project_gid — delete a project. Body is `{"data": {}}`.
#[utoipa::path(
    delete,
    path = "/projects/{project_gid}",
    params(("project_gid" = String, Path, description = "Project gid")),
    responses(
        (status = 200, description = "Project deleted; empty data record"),
        (status = 404, description = "Project not found"),
    ),
    tag = "projects"
)]
pub async fn delete_project(
    State(state): State<AppState>,
    principal: Principal,
    Path(project_gid): Path<String>,
) -> Result<Json<DataEnvelope<Document>>, AppError> {
    require_scopes(&principal, WRITE_SCOPES)?;
    let gid = Gid::from(project_gid.as_str());
    state
        .projects
        .remove(&gid)
        .ok_or_else(|| AppError::not_found("Project"))?;
    state.unpersist(&gid).await?;
    Ok(Json(DataEnvelope::new(Document::new())))
}
