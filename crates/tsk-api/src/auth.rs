//! # Authentication & Scope Authorization
//!
//! Bearer-token middleware plus per-endpoint scope checks.
//!
//! ## Token Format
//!
//! Two token forms are accepted against the configured secret:
//!
//! ```text
//! Bearer {secret}                          — personal access token
//! Bearer scoped:{scope,scope,...}:{secret} — scoped token
//! ```
//!
//! A personal access token authenticates without establishing a scope
//! set: the resulting [`Principal`] carries `scopes: None` and passes
//! every scope check — scopes are an additive restriction that only
//! exists under scoped authentication. A scoped token carries an explicit
//! comma-separated scope list (possibly empty); the distinguished
//! `default` scope is a wildcard.
//!
//! When `AUTH_TOKEN` is not configured, authentication is disabled
//! (development mode) and every request gets an unscoped principal.
//!
//! ## Scope checks
//!
//! Every endpoint declares its required scopes as a constant and passes
//! it to [`require_scopes`] at the top of the handler. The requirement
//! travels with the route registration — nothing is discovered by
//! reflection — and one granted scope out of the declared set suffices.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use tsk_rest::scope::{self, ScopeSet};

use crate::error::AppError;

// ── Secret token ────────────────────────────────────────────────────────────

/// The configured bearer secret.
///
/// Custom `Debug` redacts the value to prevent credential leakage in logs.
#[derive(Clone)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The secret itself. Only the comparison path should call this.
    fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretToken").field(&"[REDACTED]").finish()
    }
}

/// Auth configuration injected into request extensions.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Expected bearer secret. `None` disables authentication.
    pub token: Option<SecretToken>,
}

// ── Principal ───────────────────────────────────────────────────────────────

/// The authenticated caller, injected into request extensions by the
/// auth middleware and extracted by handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Scopes granted by the token. `None` under non-scoped
    /// authentication modes (personal access token, auth disabled).
    pub scopes: Option<ScopeSet>,
}

impl Principal {
    /// An unscoped principal, as produced by non-scoped authentication.
    pub fn unscoped() -> Self {
        Self { scopes: None }
    }

    /// A principal carrying an explicit granted scope set.
    pub fn with_scopes(scopes: ScopeSet) -> Self {
        Self {
            scopes: Some(scopes),
        }
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Check the caller's granted scopes against an endpoint's requirement.
///
/// Returns 403 Forbidden when a scoped principal holds none of the
/// required scopes. Unscoped principals and the `default` wildcard
/// always pass.
pub fn require_scopes(principal: &Principal, required: &[&str]) -> Result<(), AppError> {
    if scope::authorize(principal.scopes.as_ref(), required) {
        Ok(())
    } else {
        tracing::warn!(?required, "request denied: insufficient scope");
        Err(AppError::Forbidden)
    }
}

// ── Token validation ────────────────────────────────────────────────────────

/// Constant-time comparison of bearer secrets.
///
/// When lengths differ, a dummy comparison keeps timing independent of
/// where the mismatch occurs.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token in either accepted form.
///
/// `scoped:{scopes}:{secret}` splits the secret off the *last* colon, so
/// scope names containing colons (`tasks:read`) pass through intact.
pub fn parse_bearer_token(provided: &str, expected: &SecretToken) -> Result<Principal, String> {
    if let Some(rest) = provided.strip_prefix("scoped:") {
        let Some((scopes, secret)) = rest.rsplit_once(':') else {
            return Err("invalid scoped token — expected scoped:{scopes}:{secret}".to_string());
        };
        if !constant_time_token_eq(secret, expected.expose()) {
            return Err("invalid bearer token".to_string());
        }
        let scopes: ScopeSet = scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        Ok(Principal::with_scopes(scopes))
    } else if constant_time_token_eq(provided, expected.expose()) {
        Ok(Principal::unscoped())
    } else {
        Err("invalid bearer token".to_string())
    }
}

// ── Middleware ──────────────────────────────────────────────────────────────

/// Extract and validate the bearer token from the Authorization header,
/// injecting the resulting [`Principal`] into request extensions.
///
/// All rejection paths return the uniform 401 envelope.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let config = request.extensions().get::<AuthConfig>().cloned();

    match config {
        Some(AuthConfig {
            token: Some(ref expected),
        }) => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match auth_header {
                Some(value) if value.starts_with("Bearer ") => {
                    match parse_bearer_token(&value[7..], expected) {
                        Ok(principal) => {
                            request.extensions_mut().insert(principal);
                            next.run(request).await
                        }
                        Err(reason) => {
                            tracing::warn!(%reason, "authentication failed: invalid bearer token");
                            AppError::Unauthorized.into_response()
                        }
                    }
                }
                Some(_) => {
                    tracing::warn!("authentication failed: non-Bearer authorization scheme");
                    AppError::Unauthorized.into_response()
                }
                None => {
                    tracing::warn!("authentication failed: missing authorization header");
                    AppError::Unauthorized.into_response()
                }
            }
        }
        _ => {
            // Auth disabled — every request proceeds unscoped.
            request.extensions_mut().insert(Principal::unscoped());
            next.run(request).await
        }
    }
}
