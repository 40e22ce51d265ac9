//! # API Error Type
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every failure a handler surfaces is translated here, exactly once,
//! into the uniform error envelope with the matching HTTP status code.
//! Clients always receive a well-formed `{"errors": [...]}` body — never
//! a raw error string or a partial payload.
//!
//! 500-class responses additionally carry a correlation phrase minted by
//! the process-wide [`PhraseGenerator`], which `main` installs at startup
//! (tests may install a seeded one for reproducible phrases).

use std::sync::OnceLock;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tsk_rest::envelope::{ErrorEnvelope, Failure, ValidationIssue};
use tsk_rest::phrase::PhraseGenerator;

static PHRASES: OnceLock<PhraseGenerator> = OnceLock::new();

/// Install the process-wide phrase generator.
///
/// The first installation wins; later calls return the already-installed
/// generator. When nothing was installed by the time the first 500 is
/// built, an entropy-seeded generator is installed implicitly.
pub fn install_phrase_generator(generator: PhraseGenerator) -> &'static PhraseGenerator {
    PHRASES.get_or_init(|| generator)
}

fn phrases() -> &'static PhraseGenerator {
    PHRASES.get_or_init(PhraseGenerator::from_entropy)
}

/// Application-level error type that maps to the wire error envelope.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request content rejected (400). One envelope item per issue.
    #[error("validation failed")]
    Validation(Vec<ValidationIssue>),

    /// Addressed resource does not exist (404). Carries the resource
    /// label shown to the client, e.g. `"Task"`.
    #[error("{0} not found")]
    NotFound(String),

    /// Authentication failure — missing or invalid token (401).
    #[error("unauthorized")]
    Unauthorized,

    /// Authorization failure — insufficient scope (403).
    #[error("forbidden")]
    Forbidden,

    /// Anything else (500). The message reaches the client stringified,
    /// alongside a correlation phrase for support triage.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A request-level validation failure with a single message.
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::Validation(vec![ValidationIssue::message(detail)])
    }

    /// A validation failure attributed to one field.
    pub fn invalid_field(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Validation(vec![ValidationIssue::field(field, detail)])
    }

    /// A not-found failure for the given resource label.
    pub fn not_found(label: impl Into<String>) -> Self {
        Self::NotFound(label.into())
    }

    fn failure(self) -> Failure {
        match self {
            Self::Validation(issues) => Failure::Validation(issues),
            Self::NotFound(label) => Failure::NotFound(label),
            Self::Unauthorized => Failure::Authentication,
            Self::Forbidden => Failure::Authorization,
            Self::Internal(message) => Failure::Unhandled(message),
        }
    }
}

/// Lets `?` lift infallible store operations into handler results.
impl From<std::convert::Infallible> for AppError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Server-class failures are logged for operator visibility; the
        // 4xx classes are ordinary request outcomes and stay quiet.
        if let Self::Internal(message) = &self {
            tracing::error!(error = %message, "unhandled failure");
        }

        let failure = self.failure();
        let status = StatusCode::from_u16(failure.status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = ErrorEnvelope::from_failure(failure, phrases());

        (status, Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    /// Helper to extract status and envelope from a response.
    async fn response_parts(err: AppError) -> (StatusCode, ErrorEnvelope) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let envelope: ErrorEnvelope = serde_json::from_slice(&bytes).unwrap();
        (status, envelope)
    }

    #[tokio::test]
    async fn into_response_not_found() {
        let (status, envelope) = response_parts(AppError::not_found("Task")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(envelope.errors.len(), 1);
        assert_eq!(envelope.errors[0].message, "Task not found");
        assert!(envelope.errors[0].help.is_some());
        assert!(envelope.errors[0].phrase.is_none());
    }

    #[tokio::test]
    async fn into_response_validation_lists_every_issue() {
        let err = AppError::Validation(vec![
            ValidationIssue::field("name", "This field is required."),
            ValidationIssue::field("workspace", "This field is required."),
        ]);
        let (status, envelope) = response_parts(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(envelope.errors.len(), 2);
        assert_eq!(envelope.errors[0].message, "name: This field is required.");
        assert!(envelope.errors.iter().all(|e| e.phrase.is_none()));
    }

    #[tokio::test]
    async fn into_response_unauthorized() {
        let (status, envelope) = response_parts(AppError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(envelope.errors.len(), 1);
        assert!(envelope.errors[0].phrase.is_none());
    }

    #[tokio::test]
    async fn into_response_forbidden() {
        let (status, envelope) = response_parts(AppError::Forbidden).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(envelope.errors.len(), 1);
        assert!(envelope.errors[0].phrase.is_none());
    }

    #[tokio::test]
    async fn into_response_internal_carries_phrase() {
        let (status, envelope) = response_parts(AppError::Internal("store exploded".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope.errors[0].message, "store exploded");
        let phrase = envelope.errors[0].phrase.as_deref().expect("500 carries a phrase");
        assert_eq!(phrase.split('-').count(), 3);
    }

    #[tokio::test]
    async fn error_bodies_always_wrap_in_errors_list() {
        for err in [
            AppError::invalid("bad"),
            AppError::not_found("User"),
            AppError::Unauthorized,
            AppError::Forbidden,
            AppError::Internal("x".into()),
        ] {
            let response = err.into_response();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert!(value["errors"].is_array());
        }
    }

    #[test]
    fn helper_constructors() {
        match AppError::invalid_field("limit", "out of range") {
            AppError::Validation(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].field.as_deref(), Some("limit"));
            }
            other => panic!("expected Validation, got: {other:?}"),
        }
    }
}
