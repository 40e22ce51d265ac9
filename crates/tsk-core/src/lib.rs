//! # tsk-core — Foundational Types for TaskStack
//!
//! The bedrock of the TaskStack workspace. It defines the type-system
//! primitives every other crate builds on: resource identifiers, wire-level
//! resource type names, and the flat response-document model.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** [`Gid`] is a newtype with
//!    a minting constructor — no bare strings for identifiers inside the
//!    workspace, even though the wire contract treats them as opaque strings.
//!
//! 2. **One `ResourceType` enum.** A single definition of every resource
//!    kind the API serves, with its canonical wire name. Adding a resource
//!    forces every consumer to handle it.
//!
//! 3. **Documents are built fresh per request.** [`Document`] values are
//!    produced by serialization ([`Resource::compact`] and the per-resource
//!    full renderers) and never retained across requests.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tsk-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug` and `Clone`, and implement
//!   `Serialize`/`Deserialize` where they cross the wire.

pub mod document;
pub mod gid;
pub mod resource;

// Re-export primary types for ergonomic imports.
pub use document::Document;
pub use gid::Gid;
pub use resource::{Resource, ResourceType};
