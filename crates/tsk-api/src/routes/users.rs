//! # Users API
//!
//! ## Endpoints
//!
//! - `GET /users` — list users (compact), paginated
//! - `GET /users/:user_gid` — full user record
//!
//! Required scope: `users:read`. Users are read-only through this API;
//! account provisioning belongs to the identity system.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tsk_core::{document, Document, Gid, Resource};
use tsk_rest::envelope::{CollectionEnvelope, DataEnvelope};
use tsk_rest::pagination::paginate;

use crate::auth::{require_scopes, Principal};
use crate::error::AppError;
use crate::extractors::{OptFields, PageQuery, RequestUrl};
use crate::state::{compact_list, AppState, UserRecord};

const READ_SCOPES: &[&str] = &["users:read"];

/// Full user document, resolving workspace memberships to compact
/// documents.
fn full_user(user: &UserRecord, state: &AppState) -> Document {
    let photo = user
        .photo_url
        .as_ref()
        .map(|url| json!({"image_128x128": url}))
        .unwrap_or(Value::Null);

    document::from_value(json!({
        "gid": user.gid.as_str(),
        "resource_type": "user",
        "name": user.name,
        "email": user.email,
        "photo": photo,
        "workspaces": compact_list(&state.workspaces, &user.workspaces),
    }))
}

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:user_gid", get(get_user))
}

/// GET /users — compact records for all users, paginated.
#[utoipa::path(
    get,
    path = "/users",
    params(
        ("limit" = Option<String>, Query, description = "Page size, 1-100 (default 50)"),
        ("offset" = Option<String>, Query, description = "Offset token from a previous next_page"),
        ("opt_fields" = Option<String>, Query, description = "Comma-separated field paths to project"),
    ),
    responses(
        (status = 200, description = "Paginated compact user records"),
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    principal: Principal,
    page: PageQuery,
    fields: OptFields,
    url: RequestUrl,
) -> Result<Json<CollectionEnvelope<Document>>, AppError> {
    require_scopes(&principal, READ_SCOPES)?;
    let page = paginate(&state.users, page.window()).await?;
    let page = page.map(|user| fields.apply(&user.compact()));
    Ok(Json(CollectionEnvelope::from_page(page, url.as_url())))
}

/// GET /users/:user_gid — the full record for one user.
#[utoipa::path(
    get,
    path = "/users/{user_gid}",
    params(("user_gid" = String, Path, description = "User gid")),
    responses(
        (status = 200, description = "Full user record"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    principal: Principal,
    Path(user_gid): Path<String>,
    fields: OptFields,
) -> Result<Json<DataEnvelope<Document>>, AppError> {
    require_scopes(&principal, READ_SCOPES)?;
    let user = state
        .users
        .get(&Gid::from(user_gid.as_str()))
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(DataEnvelope::new(fields.apply(&full_user(&user, &state)))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorkspaceRecord;
    use chrono::Utc;

    #[test]
    fn full_user_renders_photo_and_workspaces() {
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

        let user = UserRecord {
            gid: Gid::from_string("u-1"),
            name: "Jo Field".to_string(),
            email: "jo@example.com".to_string(),
            photo_url: Some("https://img.example.com/jo.png".to_string()),
            workspaces: vec![Gid::from_string("w-1")],
            created_at: now,
            modified_at: now,
        };

        let doc = full_user(&user, &state);
        assert_eq!(doc["photo"]["image_128x128"], json!("https://img.example.com/jo.png"));
        assert_eq!(doc["workspaces"][0]["name"], json!("Marketing"));
    }

    #[test]
    fn full_user_without_photo_is_null() {
        let state = AppState::new();
        let now = Utc::now();
        let user = UserRecord {
            gid: Gid::from_string("u-1"),
            name: "Jo Field".to_string(),
            email: "jo@example.com".to_string(),
            photo_url: None,
            workspaces: Vec::new(),
            created_at: now,
            modified_at: now,
        };
        let doc = full_user(&user, &state);
        assert_eq!(doc["photo"], json!(null));
        assert_eq!(doc["workspaces"], json!([]));
    }
}
