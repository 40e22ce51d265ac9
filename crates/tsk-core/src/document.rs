//! # Response Documents
//!
//! The flat (or shallow-nested) key/value document every endpoint emits.
//! A document maps field names to JSON values — scalars, nested documents,
//! or lists of documents. Documents are produced fresh per request by the
//! serialization layer and never persisted or cached.

use serde_json::Value;

/// A response document: field name to JSON value.
pub type Document = serde_json::Map<String, Value>;

/// Build a [`Document`] from a `serde_json::Value` expected to be an object.
///
/// Non-object values yield an empty document rather than an error; callers
/// construct the value with `serde_json::json!({...})` so the object case
/// is the only one that occurs in practice.
pub fn from_value(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_object() {
        let doc = from_value(json!({"a": 1, "b": "two"}));
        assert_eq!(doc.get("a"), Some(&json!(1)));
        assert_eq!(doc.get("b"), Some(&json!("two")));
    }

    #[test]
    fn from_value_non_object_is_empty() {
        assert!(from_value(json!([1, 2, 3])).is_empty());
        assert!(from_value(json!("scalar")).is_empty());
        assert!(from_value(json!(null)).is_empty());
    }
}
