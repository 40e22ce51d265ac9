//! # Scope Authorization
//!
//! Evaluates whether a principal's granted scopes satisfy an endpoint's
//! declared requirement set.
//!
//! Scopes are an additive restriction that only exists under scope-aware
//! authentication: a principal authenticated through a non-scoped
//! mechanism (a personal access token) has no granted set at all and is
//! allowed everywhere. Under scoped authentication the distinguished
//! `"default"` scope is a wildcard, and otherwise *any one* of the
//! endpoint's required scopes suffices — OR semantics, not AND.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Scope name that unconditionally satisfies any requirement.
pub const WILDCARD_SCOPE: &str = "default";

/// Set of scope names granted to a principal for the lifetime of one
/// request. Immutable once the authentication layer has produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    /// The empty scope set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `scope` was granted.
    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    /// Whether no scopes were granted.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of granted scopes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate the granted scope names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Decide whether the granted scopes satisfy the required set.
///
/// - `granted` absent (non-scoped authentication mode) → allow.
/// - `required` empty → allow: the endpoint needs authentication only.
/// - [`WILDCARD_SCOPE`] granted → allow.
/// - Otherwise allow iff at least one required scope was granted.
///
/// This function only answers the question; mapping a denial to a 403
/// response is the caller's job.
pub fn authorize(granted: Option<&ScopeSet>, required: &[&str]) -> bool {
    let Some(granted) = granted else {
        return true;
    };
    if required.is_empty() {
        return true;
    }
    if granted.contains(WILDCARD_SCOPE) {
        return true;
    }
    required.iter().any(|scope| granted.contains(scope))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes(names: &[&str]) -> ScopeSet {
        names.iter().copied().collect()
    }

    #[test]
    fn absent_granted_set_allows_everything() {
        assert!(authorize(None, &["tasks:read"]));
        assert!(authorize(None, &[]));
    }

    #[test]
    fn empty_requirement_allows_any_principal() {
        assert!(authorize(Some(&scopes(&[])), &[]));
        assert!(authorize(Some(&scopes(&["tasks:read"])), &[]));
    }

    #[test]
    fn wildcard_satisfies_any_requirement() {
        assert!(authorize(Some(&scopes(&["default"])), &["tasks:read"]));
        assert!(authorize(
            Some(&scopes(&["default"])),
            &["workspaces:read", "workspaces:write"]
        ));
    }

    #[test]
    fn one_of_required_suffices() {
        // OR semantics: holding any one of the required scopes is enough.
        assert!(authorize(
            Some(&scopes(&["tasks:write"])),
            &["tasks:read", "tasks:write"]
        ));
    }

    #[test]
    fn disjoint_scopes_are_denied() {
        assert!(!authorize(Some(&scopes(&["projects:read"])), &["tasks:read"]));
    }

    #[test]
    fn empty_granted_set_is_denied() {
        assert!(!authorize(Some(&scopes(&[])), &["tasks:read"]));
    }

    #[test]
    fn scope_names_are_exact_matches() {
        assert!(!authorize(Some(&scopes(&["tasks"])), &["tasks:read"]));
        assert!(!authorize(Some(&scopes(&["tasks:readonly"])), &["tasks:read"]));
    }

    #[test]
    fn scope_set_from_iterator_dedupes() {
        let set: ScopeSet = ["a", "b", "a"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains("a"));
        assert!(set.contains("b"));
    }

    #[test]
    fn serde_round_trip() {
        let set = scopes(&["tasks:read", "default"]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[\"default\",\"tasks:read\"]");
        let back: ScopeSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
