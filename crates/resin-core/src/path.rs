//! # Change Normalizer
//!
//! Converts the shorthand write surface — a dotted target path plus a JSON
//! payload — into the canonical per-type change structures consumed by the
//! change engine.
//!
//! Recognized paths: `type`, `type.resources`, `type.resources.<id>`,
//! `type.lists`, and `type.lists.<name>`. Anything else is reported with
//! `PATH_INVALID` and normalizes to an empty change; payloads that do not
//! fit their path's shape are reported with `CHANGES_INVALID` and the
//! misshapen part is dropped. Normalization never fails the caller.

use crate::change::{ListDeletion, ResourceRef, TypeDeletions, TypeUpdates};
use crate::change::{DeleteChanges, UpdateChanges};
use crate::diagnostics::{self, DiagnosticSink, codes};
use crate::schema::{self, Schema, SchemaMap};
use crate::types::{Resource, ResourceId};
use serde_json::Value;

// =============================================================================
// PATH PARSING
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Resources,
    Lists,
}

#[derive(Debug)]
struct Target {
    resource_type: String,
    section: Option<Section>,
    leaf: Option<String>,
}

fn parse_path(path: &str, sink: &dyn DiagnosticSink) -> Option<Target> {
    let segments: Vec<&str> = path.split('.').collect();
    let invalid = || {
        diagnostics::error(
            sink,
            codes::PATH_INVALID,
            format!(
                "Cannot understand the target path '{path}'. Expected \
                 'type', 'type.resources[.id]', or 'type.lists[.name]'."
            ),
        );
    };

    if segments.is_empty() || segments[0].is_empty() || segments.len() > 3 {
        invalid();
        return None;
    }

    let section = match segments.get(1) {
        None => None,
        Some(&"resources") => Some(Section::Resources),
        Some(&"lists") => Some(Section::Lists),
        Some(_) => {
            invalid();
            return None;
        }
    };

    let leaf = match segments.get(2) {
        None => None,
        Some(name) if !name.is_empty() => Some((*name).to_string()),
        Some(_) => {
            invalid();
            return None;
        }
    };

    Some(Target {
        resource_type: segments[0].to_string(),
        section,
        leaf,
    })
}

// =============================================================================
// UPDATE NORMALIZATION
// =============================================================================

/// Normalize an update shorthand into canonical changes.
#[must_use]
pub fn update_changes(
    path: &str,
    payload: &Value,
    schemas: &SchemaMap,
    sink: &dyn DiagnosticSink,
) -> UpdateChanges {
    let Some(target) = parse_path(path, sink) else {
        return UpdateChanges::new();
    };
    let schema = schema::for_type(schemas, &target.resource_type);
    let mut updates = TypeUpdates::default();

    match (target.section, target.leaf) {
        (None, _) => {
            let Value::Object(sections) = payload else {
                report_shape(sink, path, "an object with 'resources' and/or 'lists'");
                return UpdateChanges::new();
            };
            for (section, value) in sections {
                match section.as_str() {
                    "resources" => {
                        updates.resources = upserted_resources(value, schema, path, sink);
                    }
                    "lists" => updates.lists = replacement_lists(value, path, sink),
                    _ => report_shape(sink, path, "only 'resources' and 'lists' sections"),
                }
            }
        }
        (Some(Section::Resources), None) => {
            updates.resources = upserted_resources(payload, schema, path, sink);
        }
        (Some(Section::Resources), Some(id)) => {
            if let Some(resource) = one_resource(payload, schema, &id) {
                updates.resources.push(resource);
            } else {
                report_shape(sink, path, "a resource object");
            }
        }
        (Some(Section::Lists), None) => {
            updates.lists = replacement_lists(payload, path, sink);
        }
        (Some(Section::Lists), Some(name)) => {
            if let Some(entries) = list_entries(payload, path, sink) {
                updates.lists.insert(name, entries);
            }
        }
    }

    if updates.is_empty() {
        UpdateChanges::new()
    } else {
        UpdateChanges::from([(target.resource_type, updates)])
    }
}

/// Resources-to-upsert from the array form (`[{..}, id, ..]`) or the map
/// form (`{ id: {..} }`, identifier injected from the key when absent).
fn upserted_resources(
    payload: &Value,
    schema: &Schema,
    path: &str,
    sink: &dyn DiagnosticSink,
) -> Vec<Resource> {
    match payload {
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| match entry {
                Value::Object(_) => Resource::from_value(entry),
                _ => match ResourceId::from_value(entry) {
                    Some(id) => {
                        let mut resource = Resource::new();
                        resource.set(schema.id_property.clone(), id.to_value());
                        Some(resource)
                    }
                    None => {
                        report_shape(sink, path, "resource objects or identifiers");
                        None
                    }
                },
            })
            .collect(),
        Value::Object(by_id) => by_id
            .iter()
            .filter_map(|(key, value)| one_resource(value, schema, key))
            .collect(),
        _ => {
            report_shape(sink, path, "a resource array or an id-keyed object");
            Vec::new()
        }
    }
}

/// One resource addressed by identifier; the identifier field is filled in
/// from the path/key when the payload does not carry it.
fn one_resource(payload: &Value, schema: &Schema, id: &str) -> Option<Resource> {
    let mut resource = Resource::from_value(payload)?;
    if schema.id_of(&resource).is_none() {
        resource.set(schema.id_property.clone(), ResourceId::from(id).to_value());
    }
    Some(resource)
}

fn replacement_lists(
    payload: &Value,
    path: &str,
    sink: &dyn DiagnosticSink,
) -> std::collections::BTreeMap<String, Vec<ResourceRef>> {
    let mut lists = std::collections::BTreeMap::new();
    let Value::Object(by_name) = payload else {
        report_shape(sink, path, "an object of list names to memberships");
        return lists;
    };
    for (name, value) in by_name {
        if let Some(entries) = list_entries(value, path, sink) {
            lists.insert(name.clone(), entries);
        }
    }
    lists
}

fn list_entries(
    payload: &Value,
    path: &str,
    sink: &dyn DiagnosticSink,
) -> Option<Vec<ResourceRef>> {
    let Value::Array(entries) = payload else {
        report_shape(sink, path, "an array of identifiers or resources");
        return None;
    };
    Some(
        entries
            .iter()
            .filter_map(|entry| {
                let parsed = ResourceRef::from_value(entry);
                if parsed.is_none() {
                    report_shape(sink, path, "identifiers or resource objects");
                }
                parsed
            })
            .collect(),
    )
}

// =============================================================================
// DELETE NORMALIZATION
// =============================================================================

/// Normalize a delete shorthand into canonical changes.
///
/// Deletes need no schema: object-form references carry their identifier
/// field, and the engine resolves it against the type's schema.
#[must_use]
pub fn delete_changes(path: &str, payload: &Value, sink: &dyn DiagnosticSink) -> DeleteChanges {
    let Some(target) = parse_path(path, sink) else {
        return DeleteChanges::new();
    };
    let mut deletions = TypeDeletions::default();

    match (target.section, target.leaf) {
        (None, _) => {
            let Value::Object(sections) = payload else {
                report_shape(sink, path, "an object with 'resources' and/or 'lists'");
                return DeleteChanges::new();
            };
            for (section, value) in sections {
                match section.as_str() {
                    "resources" => deletions.resources = removed_resources(value, path, sink),
                    "lists" => deletions.lists = list_deletions(value, path, sink),
                    _ => report_shape(sink, path, "only 'resources' and 'lists' sections"),
                }
            }
        }
        (Some(Section::Resources), None) => {
            deletions.resources = removed_resources(payload, path, sink);
        }
        (Some(Section::Resources), Some(id)) => {
            if payload.is_null() {
                deletions.resources.push(ResourceId::from(id.as_str()).into());
            } else {
                report_shape(sink, path, "no payload when addressing one resource");
            }
        }
        (Some(Section::Lists), None) => {
            deletions.lists = list_deletions(payload, path, sink);
        }
        (Some(Section::Lists), Some(name)) => {
            if let Some(deletion) = one_list_deletion(payload, path, sink) {
                deletions.lists.insert(name, deletion);
            }
        }
    }

    if deletions.is_empty() {
        DeleteChanges::new()
    } else {
        DeleteChanges::from([(target.resource_type, deletions)])
    }
}

fn removed_resources(payload: &Value, path: &str, sink: &dyn DiagnosticSink) -> Vec<ResourceRef> {
    let Value::Array(entries) = payload else {
        report_shape(sink, path, "an array of identifiers or resource objects");
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let parsed = ResourceRef::from_value(entry);
            if parsed.is_none() {
                report_shape(sink, path, "identifiers or resource objects");
            }
            parsed
        })
        .collect()
}

/// List deletions from the bare-name form (`["new"]` drops each named
/// list) or the object form (`null` drops, `[]` clears, `[ids]` removes
/// those members).
fn list_deletions(
    payload: &Value,
    path: &str,
    sink: &dyn DiagnosticSink,
) -> std::collections::BTreeMap<String, ListDeletion> {
    let mut lists = std::collections::BTreeMap::new();
    match payload {
        Value::Array(names) => {
            for name in names {
                match name.as_str() {
                    Some(name) => {
                        lists.insert(name.to_string(), ListDeletion::Drop);
                    }
                    None => report_shape(sink, path, "list names"),
                }
            }
        }
        Value::Object(by_name) => {
            for (name, value) in by_name {
                if let Some(deletion) = one_list_deletion(value, path, sink) {
                    lists.insert(name.clone(), deletion);
                }
            }
        }
        _ => report_shape(sink, path, "an array of list names or an object of lists"),
    }
    lists
}

fn one_list_deletion(
    payload: &Value,
    path: &str,
    sink: &dyn DiagnosticSink,
) -> Option<ListDeletion> {
    match payload {
        Value::Null => Some(ListDeletion::Drop),
        Value::Array(entries) if entries.is_empty() => Some(ListDeletion::Clear),
        Value::Array(entries) => Some(ListDeletion::Remove(
            entries
                .iter()
                .filter_map(|entry| {
                    let parsed = ResourceRef::from_value(entry);
                    if parsed.is_none() {
                        report_shape(sink, path, "identifiers or resource objects");
                    }
                    parsed
                })
                .collect(),
        )),
        _ => {
            report_shape(sink, path, "null, an empty array, or member identifiers");
            None
        }
    }
}

fn report_shape(sink: &dyn DiagnosticSink, path: &str, expected: &str) {
    diagnostics::error(
        sink,
        codes::CHANGES_INVALID,
        format!("The changes for '{path}' do not fit the path: expected {expected}."),
    );
}

// =============================================================================
// TESTS
// =============================================================================
