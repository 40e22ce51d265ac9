//! # Response Envelopes
//!
//! The uniform wrappers around every response body: `{"data": ...}` for
//! success, `{"errors": [...]}` for failure. Failures are classified into
//! a closed taxonomy and translated exactly once, at the boundary, into an
//! envelope plus an HTTP status — nothing is retried or swallowed here,
//! and the client never sees a raw error or a partial body.
//!
//! Building an envelope is a pure mapping from a failure description; this
//! module does not log. Request-level logging belongs to the HTTP layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::pagination::{NextPage, Page};
use crate::phrase::PhraseGenerator;

/// Help text attached to 404 responses.
pub const NOT_FOUND_HELP: &str =
    "The requested resource does not exist or you do not have access to it.";

/// Message/help pair for 401 responses.
pub const AUTHENTICATION_MESSAGE: &str =
    "A valid authentication token was not provided with the request.";
pub const AUTHENTICATION_HELP: &str =
    "Please provide a valid authentication token in the Authorization header.";

/// Message/help pair for 403 responses.
pub const AUTHORIZATION_MESSAGE: &str =
    "The authentication and request syntax was valid but the server is refusing to complete the request.";
pub const AUTHORIZATION_HELP: &str =
    "You may not have access to the requested resource or action.";

/// Help text attached to 500 responses.
pub const UNHANDLED_HELP: &str =
    "An unexpected error occurred. Please check the request format and try again.";

// ── Success envelopes ───────────────────────────────────────────────────────

/// Success envelope for a single resource: `{"data": ...}`.
///
/// Delete endpoints reuse it with an empty document: `{"data": {}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Success envelope for a collection: `{"data": [...], "next_page": ...}`.
///
/// `next_page` is always present — `null` when the collection is
/// exhausted — so clients can key on it without probing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEnvelope<T> {
    pub data: Vec<T>,
    pub next_page: Option<NextPage>,
}

impl<T> CollectionEnvelope<T> {
    /// Wrap a page, deriving `next_page` from the original request URL.
    pub fn from_page(page: Page<T>, request_url: &Url) -> Self {
        let next_page = page
            .next_offset()
            .map(|offset| NextPage::build(request_url, offset));
        Self {
            data: page.items,
            next_page,
        }
    }
}

// ── Failure taxonomy ────────────────────────────────────────────────────────

/// A rejected input field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// The offending field, when the failure is attributable to one.
    pub field: Option<String>,
    pub detail: String,
}

impl ValidationIssue {
    /// An issue attributed to a named field; rendered as `<field>: <detail>`.
    pub fn field(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            detail: detail.into(),
        }
    }

    /// A request-level issue with no single offending field.
    pub fn message(detail: impl Into<String>) -> Self {
        Self {
            field: None,
            detail: detail.into(),
        }
    }

    fn render(&self) -> String {
        match &self.field {
            Some(field) => format!("{field}: {}", self.detail),
            None => self.detail.clone(),
        }
    }
}

/// Classified request failure. Closed set: anything a handler cannot
/// classify is `Unhandled` and surfaces as a 500 with a correlation
/// phrase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    /// The request was understood but its content was rejected (400).
    #[error("validation failed")]
    Validation(Vec<ValidationIssue>),

    /// The addressed resource does not exist (404). Carries the
    /// human-readable resource label, e.g. `"Task"`.
    #[error("{0} not found")]
    NotFound(String),

    /// The caller did not authenticate (401).
    #[error("authentication required")]
    Authentication,

    /// The caller authenticated but is not allowed (403).
    #[error("insufficient scope")]
    Authorization,

    /// Anything else (500). Carries the stringified underlying error.
    #[error("{0}")]
    Unhandled(String),
}

impl Failure {
    /// HTTP status code for this failure class.
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Authentication => 401,
            Self::Authorization => 403,
            Self::Unhandled(_) => 500,
        }
    }
}

// ── Error envelope ──────────────────────────────────────────────────────────

/// A single error entry. All three keys are always serialized; `help`
/// and `phrase` are `null` where not applicable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorItem {
    pub message: String,
    pub help: Option<String>,
    pub phrase: Option<String>,
}

/// Failure envelope: `{"errors": [...]}` — always a list, even for a
/// single failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub errors: Vec<ErrorItem>,
}

impl ErrorEnvelope {
    fn single(message: String, help: Option<&str>, phrase: Option<String>) -> Self {
        Self {
            errors: vec![ErrorItem {
                message,
                help: help.map(String::from),
                phrase,
            }],
        }
    }

    /// Build the wire envelope for a failure.
    ///
    /// Only `Unhandled` failures mint a phrase — one per failure instance,
    /// shared by every item in the envelope were there several.
    pub fn from_failure(failure: Failure, phrases: &PhraseGenerator) -> Self {
        match failure {
            Failure::Validation(issues) => Self {
                errors: issues
                    .into_iter()
                    .map(|issue| ErrorItem {
                        message: issue.render(),
                        help: None,
                        phrase: None,
                    })
                    .collect(),
            },
            Failure::NotFound(label) => {
                Self::single(format!("{label} not found"), Some(NOT_FOUND_HELP), None)
            }
            Failure::Authentication => Self::single(
                AUTHENTICATION_MESSAGE.to_string(),
                Some(AUTHENTICATION_HELP),
                None,
            ),
            Failure::Authorization => Self::single(
                AUTHORIZATION_MESSAGE.to_string(),
                Some(AUTHORIZATION_HELP),
                None,
            ),
            Failure::Unhandled(message) => {
                Self::single(message, Some(UNHANDLED_HELP), Some(phrases.mint()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn phrases() -> PhraseGenerator {
        PhraseGenerator::new(StdRng::seed_from_u64(1))
    }

    fn envelope(failure: Failure) -> ErrorEnvelope {
        ErrorEnvelope::from_failure(failure, &phrases())
    }

    // ---- status mapping ----

    #[test]
    fn status_codes_per_failure_class() {
        assert_eq!(Failure::Validation(Vec::new()).status(), 400);
        assert_eq!(Failure::NotFound("Task".into()).status(), 404);
        assert_eq!(Failure::Authentication.status(), 401);
        assert_eq!(Failure::Authorization.status(), 403);
        assert_eq!(Failure::Unhandled("boom".into()).status(), 500);
    }

    // ---- envelope construction ----

    #[test]
    fn not_found_carries_label_and_help() {
        let envelope = envelope(Failure::NotFound("Workspace".into()));
        assert_eq!(envelope.errors.len(), 1);
        let item = &envelope.errors[0];
        assert_eq!(item.message, "Workspace not found");
        assert_eq!(item.help.as_deref(), Some(NOT_FOUND_HELP));
        assert_eq!(item.phrase, None);
    }

    #[test]
    fn validation_emits_one_item_per_field() {
        let envelope = envelope(Failure::Validation(vec![
            ValidationIssue::field("name", "This field is required."),
            ValidationIssue::field("workspace", "Unknown gid."),
        ]));
        assert_eq!(envelope.errors.len(), 2);
        assert_eq!(envelope.errors[0].message, "name: This field is required.");
        assert_eq!(envelope.errors[1].message, "workspace: Unknown gid.");
        assert!(envelope.errors.iter().all(|e| e.phrase.is_none()));
        assert!(envelope.errors.iter().all(|e| e.help.is_none()));
    }

    #[test]
    fn request_level_validation_issue_has_no_field_prefix() {
        let envelope = envelope(Failure::Validation(vec![ValidationIssue::message(
            "Invalid request body",
        )]));
        assert_eq!(envelope.errors[0].message, "Invalid request body");
    }

    #[test]
    fn authentication_uses_fixed_text() {
        let envelope = envelope(Failure::Authentication);
        assert_eq!(envelope.errors[0].message, AUTHENTICATION_MESSAGE);
        assert_eq!(envelope.errors[0].help.as_deref(), Some(AUTHENTICATION_HELP));
        assert_eq!(envelope.errors[0].phrase, None);
    }

    #[test]
    fn authorization_uses_fixed_text() {
        let envelope = envelope(Failure::Authorization);
        assert_eq!(envelope.errors[0].message, AUTHORIZATION_MESSAGE);
        assert_eq!(envelope.errors[0].help.as_deref(), Some(AUTHORIZATION_HELP));
        assert_eq!(envelope.errors[0].phrase, None);
    }

    #[test]
    fn unhandled_mints_a_phrase() {
        let envelope = envelope(Failure::Unhandled("store exploded".into()));
        let item = &envelope.errors[0];
        assert_eq!(item.message, "store exploded");
        assert_eq!(item.help.as_deref(), Some(UNHANDLED_HELP));
        let phrase = item.phrase.as_deref().expect("500 must carry a phrase");
        assert_eq!(phrase.split('-').count(), 3);
    }

    // ---- wire shape ----

    #[test]
    fn items_serialize_all_three_keys_with_nulls() {
        let envelope = envelope(Failure::NotFound("Task".into()));
        let value = serde_json::to_value(&envelope).unwrap();
        let item = &value["errors"][0];
        let keys: Vec<&String> = item.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["help", "message", "phrase"]);
        assert_eq!(item["phrase"], json!(null));
    }

    #[test]
    fn errors_is_a_list_even_for_single_failures() {
        let value = serde_json::to_value(envelope(Failure::Authentication)).unwrap();
        assert!(value["errors"].is_array());
        assert_eq!(value["errors"].as_array().unwrap().len(), 1);
    }

    // ---- success envelopes ----

    #[test]
    fn data_envelope_wraps_payload() {
        let value = serde_json::to_value(DataEnvelope::new(json!({"gid": "1"}))).unwrap();
        assert_eq!(value, json!({"data": {"gid": "1"}}));
    }

    #[test]
    fn empty_data_envelope_is_the_delete_body() {
        let value = serde_json::to_value(DataEnvelope::new(tsk_core::Document::new())).unwrap();
        assert_eq!(value, json!({"data": {}}));
    }

    #[test]
    fn collection_envelope_serializes_null_next_page() {
        let page = Page {
            items: vec![json!({"gid": "1"})],
            offset: 0,
            limit: 50,
            has_next: false,
        };
        let url = Url::parse("http://api.example.com/tasks").unwrap();
        let value = serde_json::to_value(CollectionEnvelope::from_page(page, &url)).unwrap();
        assert_eq!(value["next_page"], json!(null));
        assert!(value.as_object().unwrap().contains_key("next_page"));
    }

    #[test]
    fn collection_envelope_builds_next_page_from_request_url() {
        let page = Page {
            items: vec![json!({"gid": "1"}), json!({"gid": "2"})],
            offset: 0,
            limit: 2,
            has_next: true,
        };
        let url = Url::parse("http://api.example.com/tasks?limit=2").unwrap();
        let value = serde_json::to_value(CollectionEnvelope::from_page(page, &url)).unwrap();
        assert_eq!(value["next_page"]["offset"], json!("2"));
        assert_eq!(value["next_page"]["path"], json!("/tasks?limit=2&offset=2"));
        assert_eq!(
            value["next_page"]["uri"],
            json!("http://api.example.com/tasks?limit=2&offset=2")
        );
    }
}
