//! # resin-core
//!
//! The deterministic normalized-store engine for Resin - THE LOGIC.
//!
//! This crate implements an in-process, schema-aware normalized data
//! store: collections of typed resources keyed by identifier, named
//! ordered lists of identifiers per type, and read/write operations that
//! preserve referential integrity between resources and the lists that
//! reference them.
//!
//! ## Components
//!
//! - `schema` — compiles per-type configuration (identifier field,
//!   relation declarations) into the schemas every other component uses
//! - `filter` — selects resources by identifier list, partial-object
//!   match, or predicate
//! - `resolve` — expands raw resources into their relation-inlined form
//! - `change` — computes a new state tree from update/delete
//!   instructions, cascading removals into every list
//! - `store` — the owning wrapper: state, observer registry, shorthand
//!   write surface
//!
//! ## Architectural Constraints
//!
//! - Synchronous and single-threaded: every operation is a pure,
//!   non-blocking computation over in-memory structures
//! - Copy-on-write: writes return a new state tree; previous snapshots
//!   stay valid and unmodified, and untouched type buckets keep their
//!   allocation
//! - Degrading: malformed input is reported through the diagnostic
//!   channel and falls back to a safe default; it never aborts the caller

// =============================================================================
// MODULES
// =============================================================================

pub mod change;
pub mod diagnostics;
pub mod filter;
pub mod path;
pub mod query;
pub mod resolve;
pub mod schema;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Fields, ResinError, Resource, ResourceId, ResourceMap, State, TypeBucket};

// =============================================================================
// RE-EXPORTS: Engines
// =============================================================================

pub use change::{
    ChangeEngine, DeleteChanges, ListDeletion, ResourceRef, TypeDeletions, TypeUpdates,
    UpdateChanges,
};
pub use filter::Filter;
pub use query::{ReadOptions, get_resources, get_resources_by_id};
pub use resolve::{MAX_RESOLVE_DEPTH, resolve_resource};
pub use schema::{
    Cardinality, DEFAULT_ID_PROPERTY, Relation, Schema, SchemaInput, SchemaInputs, SchemaMap,
};

// =============================================================================
// RE-EXPORTS: Store & Diagnostics
// =============================================================================

pub use diagnostics::{DiagnosticSink, LogSink, MemorySink, NoopSink, Severity, Warning};
pub use store::{Store, StoreOptions, SubscriberId};
