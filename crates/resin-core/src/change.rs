//! # Change Engine
//!
//! Computes a new state tree from canonical per-type change descriptors,
//! keeping every list consistent with the resources it references.
//!
//! Both operations are pure: `(state, changes) -> state`, no hidden
//! context. The input state is never mutated; the returned state shares
//! every bucket the change did not actually modify, so consumers can use
//! allocation identity for cheap equality and memoization.

use crate::diagnostics::{self, DiagnosticSink, codes};
use crate::schema::{self, Schema, SchemaMap};
use crate::types::{Resource, ResourceId, State, TypeBucket};
use indexmap::map::Entry;
use serde_json::Value;
use std::collections::BTreeMap;

// =============================================================================
// CHANGE DESCRIPTORS
// =============================================================================

/// A resource named in a change: a bare identifier, or an object carrying
/// the identifier field. Both forms address the same target.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceRef {
    /// Bare identifier.
    Id(ResourceId),
    /// Object form; the identifier is read through the type's schema.
    Record(Resource),
}

impl ResourceRef {
    /// The identifier this reference addresses, if it carries one.
    #[must_use]
    pub fn id(&self, schema: &Schema) -> Option<ResourceId> {
        match self {
            Self::Id(id) => Some(id.clone()),
            Self::Record(resource) => schema.id_of(resource),
        }
    }

    /// Interpret a JSON value as a reference. Strings and numbers become
    /// identifiers, objects become records; anything else is not a
    /// reference.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(_) => Resource::from_value(value).map(Self::Record),
            _ => ResourceId::from_value(value).map(Self::Id),
        }
    }
}

impl From<ResourceId> for ResourceRef {
    fn from(id: ResourceId) -> Self {
        Self::Id(id)
    }
}

impl From<Resource> for ResourceRef {
    fn from(resource: Resource) -> Self {
        Self::Record(resource)
    }
}

/// Per-type update instructions: resources to upsert and list memberships
/// to replace. Record entries in a list are upserted as well.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeUpdates {
    /// Resources to insert or shallow-merge into the resource map.
    pub resources: Vec<Resource>,
    /// Replacement membership per list name.
    pub lists: BTreeMap<String, Vec<ResourceRef>>,
}

impl TypeUpdates {
    /// Whether these instructions carry no data at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.lists.is_empty()
    }
}

/// What happens to one named list in a delete change.
#[derive(Debug, Clone, PartialEq)]
pub enum ListDeletion {
    /// Delete the list itself (`null` payload, or the bare-name form).
    Drop,
    /// Keep the list key, empty its membership (empty-sequence payload).
    Clear,
    /// Remove exactly these members from the list.
    Remove(Vec<ResourceRef>),
}

/// Per-type delete instructions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDeletions {
    /// Resources to remove from the resource map (cascades into every
    /// list of the bucket).
    pub resources: Vec<ResourceRef>,
    /// Per-list deletions.
    pub lists: BTreeMap<String, ListDeletion>,
}

impl TypeDeletions {
    /// Whether these instructions carry no data at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.lists.is_empty()
    }
}

/// Canonical update change: instructions per resource type.
pub type UpdateChanges = BTreeMap<String, TypeUpdates>;

/// Canonical delete change: instructions per resource type.
pub type DeleteChanges = BTreeMap<String, TypeDeletions>;

// =============================================================================
// CHANGE ENGINE
// =============================================================================

/// The stateless change-application engine.
pub struct ChangeEngine;

impl ChangeEngine {
    /// Apply upserts and list replacements, returning the new state.
    ///
    /// Resource upserts merge shallowly: incoming top-level fields
    /// overwrite, everything else is kept. Buckets are created implicitly
    /// for types that receive data. Nothing not named in the change is
    /// removed.
    #[must_use]
    pub fn apply_updates(
        state: &State,
        schemas: &SchemaMap,
        changes: &UpdateChanges,
        sink: &dyn DiagnosticSink,
    ) -> State {
        let mut next = state.clone();

        for (resource_type, updates) in changes {
            if updates.is_empty() {
                continue;
            }
            let schema = schema::for_type(schemas, resource_type);
            let mut bucket = state
                .bucket(resource_type)
                .map(|shared| (**shared).clone())
                .unwrap_or_default();
            let mut touched = false;

            for incoming in &updates.resources {
                touched |= upsert(&mut bucket, resource_type, schema, incoming, sink);
            }

            for (list_name, entries) in &updates.lists {
                let mut members = Vec::with_capacity(entries.len());
                for entry in entries {
                    match entry {
                        ResourceRef::Id(id) => members.push(id.clone()),
                        ResourceRef::Record(resource) => {
                            if upsert(&mut bucket, resource_type, schema, resource, sink) {
                                touched = true;
                            }
                            if let Some(id) = schema.id_of(resource) {
                                members.push(id);
                            }
                        }
                    }
                }
                if bucket.lists.get(list_name) != Some(&members) {
                    bucket.lists.insert(list_name.clone(), members);
                    touched = true;
                }
            }

            if touched {
                next.insert_bucket(resource_type.clone(), bucket);
            }
        }

        next
    }

    /// Apply removals, returning the new state.
    ///
    /// Removing a resource also removes its identifier from every list in
    /// its bucket, named in the change or not. Entries that reference a
    /// type, identifier, or list with no counterpart in the state are
    /// no-ops: no warning, and the untouched bucket keeps its allocation.
    #[must_use]
    pub fn apply_deletes(
        state: &State,
        schemas: &SchemaMap,
        changes: &DeleteChanges,
        _sink: &dyn DiagnosticSink,
    ) -> State {
        let mut next = state.clone();

        for (resource_type, deletions) in changes {
            let Some(current) = state.bucket(resource_type) else {
                continue;
            };
            if deletions.is_empty() {
                continue;
            }
            let schema = schema::for_type(schemas, resource_type);

            let mut doomed: Vec<ResourceId> = Vec::new();
            for entry in &deletions.resources {
                if let Some(id) = entry.id(schema) {
                    if current.contains(&id) && !doomed.contains(&id) {
                        doomed.push(id);
                    }
                }
            }

            let mut bucket = (**current).clone();
            let mut touched = false;

            for id in &doomed {
                bucket.resources.shift_remove(id);
                touched = true;
                for members in bucket.lists.values_mut() {
                    members.retain(|member| member != id);
                }
            }

            for (list_name, deletion) in &deletions.lists {
                match deletion {
                    ListDeletion::Drop => {
                        if bucket.lists.remove(list_name).is_some() {
                            touched = true;
                        }
                    }
                    ListDeletion::Clear => {
                        if let Some(members) = bucket.lists.get_mut(list_name) {
                            if !members.is_empty() {
                                members.clear();
                                touched = true;
                            }
                        }
                    }
                    ListDeletion::Remove(entries) => {
                        if let Some(members) = bucket.lists.get_mut(list_name) {
                            let removed: Vec<ResourceId> =
                                entries.iter().filter_map(|entry| entry.id(schema)).collect();
                            let before = members.len();
                            members.retain(|member| !removed.contains(member));
                            if members.len() != before {
                                touched = true;
                            }
                        }
                    }
                }
            }

            if touched {
                next.insert_bucket(resource_type.clone(), bucket);
            }
        }

        next
    }
}

/// Insert or shallow-merge one resource. Returns whether the bucket
/// actually changed.
fn upsert(
    bucket: &mut TypeBucket,
    resource_type: &str,
    schema: &Schema,
    incoming: &Resource,
    sink: &dyn DiagnosticSink,
) -> bool {
    let Some(id) = schema.id_of(incoming) else {
        diagnostics::warn(
            sink,
            codes::UPDATE_MISSING_ID,
            format!(
                "An updated '{resource_type}' resource is missing its \
                 '{}' field; skipping it.",
                schema.id_property
            ),
        );
        return false;
    };

    match bucket.resources.entry(id) {
        Entry::Occupied(mut slot) => {
            let mut merged = slot.get().clone();
            merged.merge_shallow(incoming);
            if *slot.get() == merged {
                false
            } else {
                slot.insert(merged);
                true
            }
        }
        Entry::Vacant(slot) => {
            slot.insert(incoming.clone());
            true
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
