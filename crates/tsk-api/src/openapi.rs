//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the Bearer token security scheme to the spec.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Bearer token authentication. Personal access tokens \
                             authenticate without scopes; scoped tokens use \
                             `scoped:{scopes}:{secret}`. Set via AUTH_TOKEN env var.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "TaskStack API",
        version = "0.1.0",
        description = "Asana-compatible project-management API: workspaces, users, projects, and tasks.\n\nEvery response body is an envelope: `{\"data\": ...}` on success, `{\"errors\": [...]}` on failure. Collection endpoints paginate with opaque offset tokens and emit a `next_page` descriptor; `opt_fields` narrows any response to the requested field paths.\n\nAuthentication: Bearer token via `Authorization: Bearer <token>`. Health probes (`/health/*`) are unauthenticated.",
        license(name = "Apache-2.0")
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        // Workspaces
        crate::routes::workspaces::list_workspaces,
        crate::routes::workspaces::get_workspace,
        crate::routes::workspaces::update_workspace,
        // Users
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        // Projects
        crate::routes::projects::list_projects,
        crate::routes::projects::create_project,
        crate::routes::projects::get_project,
        crate::routes::projects::update_project,
        crate::routes::projects::delete_project,
        // Tasks
        crate::routes::tasks::list_tasks,
        crate::routes::tasks::create_task,
        crate::routes::tasks::get_task,
        crate::routes::tasks::update_task,
        crate::routes::tasks::delete_task,
    ),
    components(schemas(
        crate::routes::workspaces::UpdateWorkspaceRequest,
        crate::routes::projects::CreateProjectRequest,
        crate::routes::projects::UpdateProjectRequest,
        crate::routes::tasks::CreateTaskRequest,
        crate::routes::tasks::UpdateTaskRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "workspaces", description = "Workspace operations"),
        (name = "users", description = "User operations"),
        (name = "projects", description = "Project operations"),
        (name = "tasks", description = "Task operations"),
    )
)]
pub struct ApiDoc;

/// Router serving the generated spec.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_spec))
}

async fn serve_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_contains_every_resource_path() {
        let spec = ApiDoc::openapi();
        for expected in [
            "/workspaces",
            "/workspaces/{workspace_gid}",
            "/users",
            "/users/{user_gid}",
            "/projects",
            "/projects/{project_gid}",
            "/tasks",
            "/tasks/{task_gid}",
        ] {
            assert!(
                spec.paths.paths.contains_key(expected),
                "missing path {expected}"
            );
        }
    }

    #[test]
    fn spec_registers_request_schemas() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("components present");
        for expected in [
            "UpdateWorkspaceRequest",
            "CreateProjectRequest",
            "UpdateProjectRequest",
            "CreateTaskRequest",
            "UpdateTaskRequest",
        ] {
            assert!(
                components.schemas.contains_key(expected),
                "missing schema {expected}"
            );
        }
    }
}
