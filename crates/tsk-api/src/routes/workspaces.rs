//! # Workspaces API
//!
//! ## Endpoints
//!
//! - `GET /workspaces` — list workspaces (compact), paginated
//! - `GET /workspaces/:workspace_gid` — full workspace record
//! - `PUT /workspaces/:workspace_gid` — update (name)
//!
//! Required scope: `workspaces:read` (writes also accept
//! `workspaces:write`). Workspaces are provisioned out of band; there is
//! no create or delete endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
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
use crate::state::{AppState, WorkspaceRecord};

const READ_SCOPES: &[&str] = &["workspaces:read"];
const WRITE_SCOPES: &[&str] = &["workspaces:read", "workspaces:write"];

/// Request to update a workspace. Only the name can change.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateWorkspaceRequest {
    pub name: Option<String>,
}

impl Validate for UpdateWorkspaceRequest {
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

/// Full workspace document.
fn full_workspace(workspace: &WorkspaceRecord) -> Document {
    document::from_value(json!({
        "gid": workspace.gid.as_str(),
        "resource_type": "workspace",
        "name": workspace.name,
        "email_domains": workspace.email_domains,
        "is_organization": workspace.is_organization,
    }))
}

/// Build the workspaces router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/workspaces", get(list_workspaces))
        .route(
            "/workspaces/:workspace_gid",
            get(get_workspace).put(update_workspace),
        )
}

/// GET /workspaces — compact records for all visible workspaces.
#[utoipa::path(
    get,
    path = "/workspaces",
    params(
        ("limit" = Option<String>, Query, description = "Page size, 1-100 (default 50)"),
        ("offset" = Option<String>, Query, description = "Offset token from a previous next_page"),
        ("opt_fields" = Option<String>, Query, description = "Comma-separated field paths to project"),
    ),
    responses(
        (status = 200, description = "Paginated compact workspace records"),
    ),
    tag = "workspaces"
)]
pub async fn list_workspaces(
    State(state): State<AppState>,
    principal: Principal,
    page: PageQuery,
    fields: OptFields,
    url: RequestUrl,
) -> Result<Json<CollectionEnvelope<Document>>, AppError> {
    require_scopes(&principal, READ_SCOPES)?;
    let page = paginate(&state.workspaces, page.window()).await?;
    let page = page.map(|workspace| fields.apply(&workspace.compact()));
    Ok(Json(CollectionEnvelope::from_page(page, url.as_url())))
}

/// GET /workspaces/:workspace_gid — the full record for one workspace.
#[utoipa::path(
    get,
    path = "/workspaces/{workspace_gid}",
    params(("workspace_gid" = String, Path, description = "Workspace gid")),
    responses(
        (status = 200, description = "Full workspace record"),
        (status = 404, description = "Workspace not found"),
    ),
    tag = "workspaces"
)]
pub async fn get_workspace(
    State(state): State<AppState>,
    principal: Principal,
    Path(workspace_gid): Path<String>,
    fields: OptFields,
) -> Result<Json<DataEnvelope<Document>>, AppError> {
    require_scopes(&principal, READ_SCOPES)?;
    let workspace = state
        .workspaces
        .get(&Gid::from(workspace_gid.as_str()))
        .ok_or_else(|| AppError::not_found("Workspace"))?;
    Ok(Json(DataEnvelope::new(
        fields.apply(&full_workspace(&workspace)),
    )))
}

/// PUT /workspaces/:workspace_gid — update a workspace.
#[utoipa::path(
    put,
    path = "/workspaces/{workspace_gid}",
    params(("workspace_gid" = String, Path, description = "Workspace gid")),
    request_body = UpdateWorkspaceRequest,
    responses(
        (status = 200, description = "Updated full workspace record"),
        (status = 404, description = "Workspace not found"),
    ),
    tag = "workspaces"
)]
pub async fn update_workspace(
    State(state): State<AppState>,
    principal: Principal,
    Path(workspace_gid): Path<String>,
    fields: OptFields,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DataEnvelope<Document>>, AppError> {
    require_scopes(&principal, WRITE_SCOPES)?;
    let req: UpdateWorkspaceRequest = extract_data(body)?;

    let updated = state
        .workspaces
        .update(&Gid::from(workspace_gid.as_str()), |workspace| {
            if let Some(name) = &req.name {
                workspace.name = name.clone();
            }
            workspace.modified_at = Utc::now();
        })
        .ok_or_else(|| AppError::not_found("Workspace"))?;

    state.persist(&updated).await?;
    Ok(Json(DataEnvelope::new(
        fields.apply(&full_workspace(&updated)),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_workspace_shape() {
        let now = Utc::now();
        let workspace = WorkspaceRecord {
            gid: Gid::from_string("w-1"),
            name: "Marketing".to_string(),
            email_domains: vec!["example.com".to_string()],
            is_organization: true,
            created_at: now,
            modified_at: now,
        };
        let doc = full_workspace(&workspace);
        assert_eq!(doc.len(), 5);
        assert_eq!(doc["gid"], json!("w-1"));
        assert_eq!(doc["resource_type"], json!("workspace"));
        assert_eq!(doc["email_domains"], json!(["example.com"]));
        assert_eq!(doc["is_organization"], json!(true));
    }

    #[test]
    fn update_request_accepts_absent_name() {
        let absent: UpdateWorkspaceRequest = serde_json::from_value(json!({})).unwrap();
        assert!(absent.validate().is_ok());
    }
}
