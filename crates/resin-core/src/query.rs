//! # Read Path
//!
//! Composes the filter engine and the resolver into the store's read
//! operations.
//!
//! Identifier-list filters match on raw resources and resolve the
//! survivors; object and predicate filters resolve first, so relation
//! fields are visible to the match. Both entry points share one
//! filtered/resolved set; `get_resources_by_id` is the identifier-keyed
//! form of the same read.

use crate::diagnostics::{self, DiagnosticSink, codes};
use crate::filter::{self, Filter};
use crate::resolve::resolve_resource;
use crate::schema::{self, SchemaMap};
use crate::types::{Resource, ResourceId, State};
use indexmap::IndexMap;

/// Per-read options.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// Expand relation fields into the referenced resources. On by
    /// default; turn off to read stored forms verbatim.
    pub resolve: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { resolve: true }
    }
}

impl ReadOptions {
    /// Options for reading stored forms without relation expansion.
    #[must_use]
    pub fn raw() -> Self {
        Self { resolve: false }
    }
}

/// Read a type's resources as an ordered sequence.
///
/// Identifier-list filters drive the output order; other forms follow the
/// resource map's insertion order. An unknown resource type is reported
/// and yields an empty result.
#[must_use]
pub fn get_resources(
    state: &State,
    schemas: &SchemaMap,
    resource_type: &str,
    filter: Option<&Filter>,
    options: &ReadOptions,
    sink: &dyn DiagnosticSink,
) -> Vec<Resource> {
    let Some(bucket) = state.bucket(resource_type) else {
        diagnostics::warn(
            sink,
            codes::READ_UNKNOWN_TYPE,
            format!(
                "A read named a resource type that does not exist: \
                 '{resource_type}'. Did you make a typo?"
            ),
        );
        return Vec::new();
    };

    let expand = |resource: &Resource| {
        if options.resolve {
            resolve_resource(state, resource_type, resource, schemas)
        } else {
            resource.clone()
        }
    };

    match filter {
        Some(Filter::Ids(ids)) => filter::select_by_ids(&bucket.resources, ids)
            .into_iter()
            .map(expand)
            .collect(),
        Some(Filter::Matches(partial)) => bucket
            .resources
            .values()
            .map(expand)
            .filter(|resource| filter::matches(resource, partial))
            .collect(),
        Some(Filter::Predicate(predicate)) => bucket
            .resources
            .values()
            .map(expand)
            .filter(|resource| predicate(resource, &bucket.resources))
            .collect(),
        None => bucket.resources.values().map(expand).collect(),
    }
}

/// The same read, keyed by identifier.
#[must_use]
pub fn get_resources_by_id(
    state: &State,
    schemas: &SchemaMap,
    resource_type: &str,
    filter: Option<&Filter>,
    options: &ReadOptions,
    sink: &dyn DiagnosticSink,
) -> IndexMap<ResourceId, Resource> {
    let schema = schema::for_type(schemas, resource_type);
    get_resources(state, schemas, resource_type, filter, options, sink)
        .into_iter()
        .filter_map(|resource| schema.id_of(&resource).map(|id| (id, resource)))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
