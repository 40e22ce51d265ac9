//! # tsk-rest — Generic Resource-Access Layer
//!
//! The cross-cutting machinery shared by every TaskStack endpoint. Four
//! components, each a pure, request-scoped function over its inputs:
//!
//! - [`pagination`] — opaque offset-token pagination over ordered
//!   collections, with `next_page` descriptor building.
//! - [`projection`] — `opt_fields` shaping of response documents, with
//!   dot-notation descent into nested documents and lists.
//! - [`scope`] — scope-based authorization: wildcard `"default"` plus
//!   OR semantics over an endpoint's declared requirement set.
//! - [`envelope`] — the uniform success/error wire wrappers and the
//!   failure-class-to-status mapping, with [`phrase`] minting the
//!   correlation phrase that 500-class responses carry.
//!
//! ## Concurrency Model
//!
//! This layer is stateless: every call operates on inputs passed in and
//! returns outputs with no retained state, so the natural unit of
//! concurrency is one independent execution per inbound request. No locks,
//! queues, timers, or long-lived resources are owned here — the only
//! mutable state in the crate is the RNG inside [`phrase::PhraseGenerator`],
//! which is injected at construction.
//!
//! ## Compatibility
//!
//! The token encoding, clamping bounds, projection fallback, and envelope
//! shapes are wire-compatible with the Asana client ecosystem. Tolerant
//! decoding is deliberate: a malformed page token means "start of the
//! collection", never an error.

pub mod envelope;
pub mod pagination;
pub mod phrase;
pub mod projection;
pub mod scope;

// Re-export primary types for ergonomic imports.
pub use envelope::{CollectionEnvelope, DataEnvelope, ErrorEnvelope, ErrorItem, Failure, ValidationIssue};
pub use pagination::{paginate, NextPage, OrderedCollection, Page, PageWindow};
pub use phrase::PhraseGenerator;
pub use projection::project;
pub use scope::{authorize, ScopeSet, WILDCARD_SCOPE};
