//! # Resource Identifiers
//!
//! Every resource carries a `gid` — a globally unique identifier exposed
//! on the wire as an opaque string. Gids are minted as canonical UUIDv4
//! strings, but nothing outside the minting constructor may assume that:
//! the API contract says "string", and imported data may carry identifiers
//! in other shapes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique identifier of a resource, as an opaque string.
///
/// Comparison and hashing operate on the string form. There is no
/// structural validation on construction — a gid is only meaningful as a
/// lookup key against a collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gid(String);

impl Gid {
    /// Mint a new random gid (canonical hyphenated UUIDv4 form).
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an identifier string received from the outside.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Gid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Gid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Gid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Gid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for Gid {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_gids_are_unique() {
        let a = Gid::new();
        let b = Gid::new();
        assert_ne!(a, b);
    }

    #[test]
    fn minted_gid_is_canonical_uuid() {
        let gid = Gid::new();
        assert!(Uuid::parse_str(gid.as_str()).is_ok());
    }

    #[test]
    fn display_is_bare_string() {
        let gid = Gid::from_string("12345");
        assert_eq!(format!("{gid}"), "12345");
    }

    #[test]
    fn serde_is_transparent() {
        let gid = Gid::from_string("abc-123");
        let json = serde_json::to_string(&gid).unwrap();
        assert_eq!(json, "\"abc-123\"");
        let back: Gid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, gid);
    }

    #[test]
    fn compares_against_str() {
        let gid = Gid::from_string("x");
        assert!(gid == *"x");
    }
}
