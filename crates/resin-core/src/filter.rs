//! # Filter Engine
//!
//! Selects a subset of a type's resources by one of three filter forms:
//! identifier list, partial-object match, or predicate function.
//!
//! The filter is a tagged variant resolved once at the entry point; dynamic
//! inputs (a JSON filter argument) are classified by [`Filter::from_value`]
//! and invalid shapes degrade to select-all. Resolution ordering — ids match
//! on raw resources, object/predicate forms match on resolved ones — is the
//! read path's business (`query`); this module supplies the selection
//! primitives.

use crate::diagnostics::{self, DiagnosticSink, codes};
use crate::types::{Resource, ResourceId, ResourceMap};
use serde_json::Value;
use std::fmt;

// =============================================================================
// FILTER
// =============================================================================

/// Predicate form: receives the (resolved) candidate and the full raw
/// resource map of the type, for cross-resource comparisons.
pub type Predicate = Box<dyn Fn(&Resource, &ResourceMap) -> bool>;

/// The three filter forms. `None` at the call site means select-all.
pub enum Filter {
    /// Select exactly these identifiers, in this order, dropping misses.
    Ids(Vec<ResourceId>),
    /// Select resources whose fields are a deep-equal superset of these.
    Matches(Resource),
    /// Select resources the function approves.
    Predicate(Predicate),
}

impl Filter {
    /// Identifier-list filter.
    #[must_use]
    pub fn ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ResourceId>,
    {
        Self::Ids(ids.into_iter().map(Into::into).collect())
    }

    /// Partial-object filter.
    #[must_use]
    pub fn matching(fields: Resource) -> Self {
        Self::Matches(fields)
    }

    /// Predicate filter.
    #[must_use]
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Resource, &ResourceMap) -> bool + 'static,
    {
        Self::Predicate(Box::new(f))
    }

    /// Classify a dynamic JSON filter value.
    ///
    /// Arrays become identifier lists (non-identifier entries are reported
    /// with `FILTER_INVALID_ID` and skipped); objects become partial-object
    /// matches. Anything else is reported with `FILTER_INVALID` and returns
    /// `None`, which callers treat as select-all.
    #[must_use]
    pub fn from_value(value: &Value, sink: &dyn DiagnosticSink) -> Option<Self> {
        match value {
            Value::Array(entries) => {
                let mut ids = Vec::with_capacity(entries.len());
                for entry in entries {
                    match ResourceId::from_value(entry) {
                        Some(id) => ids.push(id),
                        None => diagnostics::error(
                            sink,
                            codes::FILTER_INVALID_ID,
                            format!(
                                "Identifier-list filters may only contain strings and \
                                 numbers; skipping {entry}."
                            ),
                        ),
                    }
                }
                Some(Self::Ids(ids))
            }
            Value::Object(fields) => Some(Self::Matches(Resource::from_fields(fields.clone()))),
            _ => {
                diagnostics::error(
                    sink,
                    codes::FILTER_INVALID,
                    "A filter must be an identifier list, an object, or a predicate. \
                     Selecting all resources instead.",
                );
                None
            }
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ids(ids) => f.debug_tuple("Ids").field(ids).finish(),
            Self::Matches(fields) => f.debug_tuple("Matches").field(fields).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

// =============================================================================
// SELECTION PRIMITIVES
// =============================================================================

/// Resources named by `ids`, in the order of `ids`, silently dropping
/// identifiers with no matching resource.
#[must_use]
pub fn select_by_ids<'a>(resources: &'a ResourceMap, ids: &[ResourceId]) -> Vec<&'a Resource> {
    ids.iter().filter_map(|id| resources.get(id)).collect()
}

/// Structural subset match: `true` iff every field of `filter` is present
/// in `candidate` with a deeply-equal value. Arrays and nested objects
/// compare by value; fields absent from the filter are unconstrained.
#[must_use]
pub fn matches(candidate: &Resource, filter: &Resource) -> bool {
    filter
        .iter()
        .all(|(field, expected)| candidate.get(field) == Some(expected))
}

// =============================================================================
// TESTS
// =============================================================================
