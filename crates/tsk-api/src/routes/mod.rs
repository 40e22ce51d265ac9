//! # API Route Modules
//!
//! One module per resource, each exposing a `router()` that the
//! application assembler merges:
//!
//! - `workspaces` — workspace listing, retrieval, and rename.
//! - `users` — user listing and retrieval (read-only surface).
//! - `projects` — full project CRUD.
//! - `tasks` — full task CRUD, including completion stamping.
//!
//! Every module follows the same shape: request DTOs with [`Validate`]
//! impls, a full-document renderer that resolves cross-resource
//! references, scope constants passed to `require_scopes` at the top of
//! each handler, and pagination/projection via the shared machinery.
//!
//! [`Validate`]: crate::extractors::Validate

pub mod projects;
pub mod tasks;
pub mod users;
pub mod workspaces;
