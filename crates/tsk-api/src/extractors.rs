//! # Custom Extractors & Request Validation
//!
//! Query-side extractors for the shared endpoint machinery — pagination
//! parameters, `opt_fields`, and the absolute request URL — plus the JSON
//! body helpers every write endpoint uses.
//!
//! Request bodies arrive wrapped as `{"data": {...}}`; a flat body without
//! the wrapper is accepted as a fallback for hand-written clients.

use axum::extract::rejection::JsonRejection;
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tsk_core::Document;
use tsk_rest::envelope::ValidationIssue;
use tsk_rest::pagination::{PageWindow, LIMIT_PARAM, OFFSET_PARAM};
use tsk_rest::projection::{project, split_fields};
use url::Url;

use crate::error::AppError;

/// Issues collected by request validation.
pub type ValidationIssues = Vec<ValidationIssue>;

/// Deserializer for update fields that distinguish "absent" from an
/// explicit `null`: any present value — `null` included — becomes `Some`.
///
/// Plain `Option<Option<T>>` cannot make that distinction (serde folds a
/// present `null` into the outer `None`), so fields that treat `null` as
/// "clear this value" pair this with a struct-level `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Trait for request DTOs that validate business rules beyond what serde
/// deserialization checks.
pub trait Validate {
    /// Validate business rules, collecting every issue rather than
    /// stopping at the first.
    fn validate(&self) -> Result<(), ValidationIssues>;
}

fn query_pairs(parts: &Parts) -> Vec<(String, String)> {
    parts
        .uri
        .query()
        .map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

// ── PageQuery ───────────────────────────────────────────────────────────────

/// Raw pagination parameters as the client sent them.
///
/// Values stay strings here; clamping and tolerant decoding happen in
/// [`PageWindow::from_raw`], so a malformed `offset` or `limit` can never
/// reject a request.
#[derive(Debug, Clone, Default)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PageQuery {
    /// Resolve into a clamped, tolerant pagination window.
    pub fn window(&self) -> PageWindow {
        PageWindow::from_raw(self.limit.as_deref(), self.offset.as_deref())
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for PageQuery {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut query = Self::default();
        for (key, value) in query_pairs(parts) {
            match key.as_str() {
                LIMIT_PARAM => query.limit = Some(value),
                OFFSET_PARAM => query.offset = Some(value),
                _ => {}
            }
        }
        Ok(query)
    }
}

// ── OptFields ───────────────────────────────────────────────────────────────

/// Requested response field paths, from `opt_fields`.
///
/// A single occurrence is split on commas; repeated occurrences are taken
/// one field path each. An empty list means "full default shape".
#[derive(Debug, Clone, Default)]
pub struct OptFields(pub Vec<String>);

impl OptFields {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Project a document down to the requested fields; identity when no
    /// fields were requested.
    pub fn apply(&self, document: &Document) -> Document {
        project(document, &self.0)
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for OptFields {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let values: Vec<String> = query_pairs(parts)
            .into_iter()
            .filter(|(key, _)| key == "opt_fields")
            .map(|(_, value)| value)
            .collect();

        let fields = match values.as_slice() {
            [] => Vec::new(),
            [single] => split_fields(single),
            many => many
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect(),
        };

        Ok(Self(fields))
    }
}

// ── RequestUrl ──────────────────────────────────────────────────────────────

/// Absolute URL of the current request, reconstructed from the Host
/// header (and `x-forwarded-proto` when a proxy terminates TLS).
///
/// Needed to mint `next_page.uri`; the relative `path` rides along.
#[derive(Debug, Clone)]
pub struct RequestUrl(Url);

impl RequestUrl {
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for RequestUrl {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http");
        let host = parts
            .headers
            .get(axum::http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("localhost");
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        Url::parse(&format!("{scheme}://{host}{path_and_query}"))
            .map(Self)
            .map_err(|e| AppError::Internal(format!("request URL could not be reconstructed: {e}")))
    }
}

// ── JSON body helpers ───────────────────────────────────────────────────────

/// Extract a JSON body, mapping deserialization failures to a 400
/// validation envelope.
pub fn extract_json(result: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    result
        .map(|Json(value)| value)
        .map_err(|err| AppError::invalid(format!("Invalid request body: {}", err.body_text())))
}

/// Unwrap the `{"data": {...}}` envelope from a request body, falling
/// back to the body itself when the wrapper is absent.
pub fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(ref map) if map.get("data").is_some_and(Value::is_object) => {
            map.get("data").cloned().unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Extract, unwrap, deserialize, and validate a request body in one step.
pub fn extract_data<T: DeserializeOwned + Validate>(
    result: Result<Json<Value>, JsonRejection>,
) -> Result<T, AppError> {
    let value = unwrap_data(extract_json(result)?);
    let parsed: T = serde_json::from_value(value)
        .map_err(|err| AppError::invalid(format!("Invalid request body: {err}")))?;
    parsed.validate().map_err(AppError::Validation)?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        name: Option<String>,
    }

    impl Validate for Probe {
        fn validate(&self) -> Result<(), ValidationIssues> {
            match &self.name {
                Some(name) if !name.trim().is_empty() => Ok(()),
                _ => Err(vec![ValidationIssue::field("name", "This field is required.")]),
            }
        }
    }

    fn parse_probe(value: Value) -> Result<Probe, AppError> {
        extract_data(Ok(Json(value)))
    }

    #[test]
    fn data_wrapper_is_unwrapped() {
        let probe = parse_probe(json!({"data": {"name": "x"}})).unwrap();
        assert_eq!(probe.name.as_deref(), Some("x"));
    }

    #[test]
    fn flat_body_fallback() {
        let probe = parse_probe(json!({"name": "x"})).unwrap();
        assert_eq!(probe.name.as_deref(), Some("x"));
    }

    #[test]
    fn non_object_data_key_falls_back_to_flat() {
        // {"data": "scalar"} has no object under `data`, so the whole body
        // is treated as flat — and `data` is then an unknown field.
        let probe = parse_probe(json!({"data": "scalar", "name": "x"})).unwrap();
        assert_eq!(probe.name.as_deref(), Some("x"));
    }

    #[test]
    fn validation_issues_surface_as_validation_error() {
        match parse_probe(json!({"data": {}})) {
            Err(AppError::Validation(issues)) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].field.as_deref(), Some("name"));
            }
            other => panic!("expected Validation, got: {other:?}"),
        }
    }

    #[test]
    fn page_query_window_applies_defaults() {
        let query = PageQuery::default();
        let window = query.window();
        assert_eq!(window.offset, 0);
        assert_eq!(window.limit, 50);
    }

    #[test]
    fn opt_fields_apply_is_identity_when_empty() {
        let doc = tsk_core::document::from_value(json!({"a": 1}));
        assert_eq!(OptFields::default().apply(&doc), doc);
    }
}
