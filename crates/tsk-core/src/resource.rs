//! # Resource Kinds and the Serialization Contract
//!
//! [`ResourceType`] enumerates every resource kind the API serves, with its
//! canonical wire name (the `resource_type` field of every document).
//!
//! [`Resource`] is the contract each record type fulfils for the generic
//! endpoint machinery: an identity, a display name, and a compact document
//! rendering. Full renderings resolve cross-resource references and live
//! with the route handlers that can see the other collections.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::document::{self, Document};
use crate::gid::Gid;

/// The base type of a resource, as exposed in the `resource_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Workspace,
    User,
    Project,
    Task,
}

impl ResourceType {
    /// Canonical wire name of this resource type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::User => "user",
            Self::Project => "project",
            Self::Task => "task",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract between a stored record and the generic endpoint machinery.
///
/// The compact rendering is uniform across resources — `gid`,
/// `resource_type`, `name` — so it ships as a default implementation.
pub trait Resource {
    /// Wire name of this record's resource type.
    const TYPE: ResourceType;

    /// The record's globally unique identifier.
    fn gid(&self) -> &Gid;

    /// The record's display name.
    fn name(&self) -> &str;

    /// Compact document: the short form used in lists and cross-references.
    fn compact(&self) -> Document {
        document::from_value(json!({
            "gid": self.gid().as_str(),
            "resource_type": Self::TYPE.as_str(),
            "name": self.name(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget {
        gid: Gid,
        name: String,
    }

    impl Resource for Widget {
        const TYPE: ResourceType = ResourceType::Task;

        fn gid(&self) -> &Gid {
            &self.gid
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn resource_type_wire_names() {
        assert_eq!(ResourceType::Workspace.as_str(), "workspace");
        assert_eq!(ResourceType::User.as_str(), "user");
        assert_eq!(ResourceType::Project.as_str(), "project");
        assert_eq!(ResourceType::Task.as_str(), "task");
    }

    #[test]
    fn resource_type_serializes_to_wire_name() {
        let json = serde_json::to_string(&ResourceType::Workspace).unwrap();
        assert_eq!(json, "\"workspace\"");
    }

    #[test]
    fn compact_has_exactly_three_fields() {
        let widget = Widget {
            gid: Gid::from_string("w-1"),
            name: "Ship it".to_string(),
        };
        let doc = widget.compact();
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.get("gid"), Some(&serde_json::json!("w-1")));
        assert_eq!(doc.get("resource_type"), Some(&serde_json::json!("task")));
        assert_eq!(doc.get("name"), Some(&serde_json::json!("Ship it")));
    }
}
