//! # `opt_fields` Projection
//!
//! Narrows a response document to the fields a caller asked for. Field
//! paths use dot notation to reach into nested documents and lists
//! (numeric segments index lists). Paths that do not resolve are silently
//! dropped — a typo in `opt_fields` never produces an error.
//!
//! When *none* of the requested fields resolve, the full document is
//! returned unchanged. That fallback is a compatibility behavior clients
//! depend on (a misspelled field list still yields a usable payload) and
//! is pinned by test so any future change is a conscious decision.

use serde_json::Value;
use tsk_core::Document;

/// Project a document down to the requested field paths.
///
/// - An empty `fields` slice returns the document unchanged.
/// - Top-level keys are copied verbatim when present, JSON nulls included.
/// - Dotted paths descend nested documents and lists; the projected key is
///   the full dotted path string. A dotted path resolving to null is
///   dropped, like any other unresolvable path.
/// - If nothing resolved, the full document is returned unchanged.
///
/// Pure function: callers loop per item when projecting a collection.
pub fn project(document: &Document, fields: &[String]) -> Document {
    if fields.is_empty() {
        return document.clone();
    }

    let mut projected = Document::new();
    for field in fields {
        if let Some(value) = document.get(field.as_str()) {
            // Direct hit wins, so a flat key containing dots shadows the
            // path interpretation.
            projected.insert(field.clone(), value.clone());
        } else if field.contains('.') {
            if let Some(value) = resolve_path(document, field) {
                if !value.is_null() {
                    projected.insert(field.clone(), value.clone());
                }
            }
        }
    }

    if projected.is_empty() {
        document.clone()
    } else {
        projected
    }
}

/// Split a comma-separated `opt_fields` value into trimmed field paths.
pub fn split_fields(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Walk a dotted path into a document.
///
/// Each segment descends one level: object segments look up a key, list
/// segments parse as a zero-based index. Missing keys, non-numeric list
/// segments, out-of-range indexes, and descent into scalars all resolve
/// to `None`.
fn resolve_path<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }

    Some(current)
}
