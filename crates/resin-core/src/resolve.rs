//! # Resource Resolver
//!
//! Expands a raw stored resource into its externally visible form by
//! inlining related resources, recursively, using each target type's own
//! schema.
//!
//! Relation cycles are handled with an explicit visited set of
//! `(type, identifier)` pairs threaded through the recursion: when a pair
//! repeats on the current chain, the relation field keeps its raw,
//! unresolved value. A depth backstop bounds recursion through resources
//! that carry no identifier at all. Resolution never mutates the stored
//! resource and never fails.

use crate::schema::{self, Cardinality, Relation, SchemaMap};
use crate::types::{Fields, Resource, ResourceId, State};
use serde_json::Value;
use std::collections::BTreeSet;

/// Backstop for recursion through identifier-less resources, which the
/// visited set cannot catch.
pub const MAX_RESOLVE_DEPTH: usize = 64;

type Visited = BTreeSet<(String, ResourceId)>;

/// Resolve one raw resource against the current state.
///
/// Returns a new resource; declared relation fields are replaced by their
/// referenced resource(s), everything else passes through unchanged.
#[must_use]
pub fn resolve_resource(
    state: &State,
    resource_type: &str,
    resource: &Resource,
    schemas: &SchemaMap,
) -> Resource {
    let mut visited = Visited::new();
    resolve_inner(state, resource_type, resource, schemas, &mut visited, 0)
}

fn resolve_inner(
    state: &State,
    resource_type: &str,
    resource: &Resource,
    schemas: &SchemaMap,
    visited: &mut Visited,
    depth: usize,
) -> Resource {
    if depth >= MAX_RESOLVE_DEPTH {
        return resource.clone();
    }

    let schema = schema::for_type(schemas, resource_type);
    let marker = schema
        .id_of(resource)
        .map(|id| (resource_type.to_string(), id));
    if let Some(pair) = &marker {
        visited.insert(pair.clone());
    }

    let mut fields = Fields::new();
    for (field, value) in resource.iter() {
        let resolved = match schema.relation(field) {
            Some(relation) => match relation.cardinality {
                Cardinality::One => {
                    resolve_one(state, relation, value, schemas, visited, depth)
                }
                Cardinality::Many => {
                    resolve_many(state, relation, value, schemas, visited, depth)
                }
            },
            None => value.clone(),
        };
        fields.insert(field.clone(), resolved);
    }

    if let Some(pair) = &marker {
        visited.remove(pair);
    }

    Resource::from_fields(fields)
}

/// To-one field: identifier in, resolved resource (or `null`) out.
fn resolve_one(
    state: &State,
    relation: &Relation,
    value: &Value,
    schemas: &SchemaMap,
    visited: &mut Visited,
    depth: usize,
) -> Value {
    let Some(id) = ResourceId::from_value(value) else {
        return value.clone();
    };
    if visited.contains(&(relation.resource_type.clone(), id.clone())) {
        return value.clone();
    }
    match state
        .bucket(&relation.resource_type)
        .and_then(|bucket| bucket.resources.get(&id))
    {
        Some(target) => resolve_inner(
            state,
            &relation.resource_type,
            target,
            schemas,
            visited,
            depth + 1,
        )
        .to_value(),
        None => Value::Null,
    }
}

/// To-many field: identifier sequence (or the name of a list in the target
/// type's bucket) in, sequence of resolved resources out. Identifiers that
/// no longer exist are omitted; members on the current resolution chain
/// stay as raw identifiers.
fn resolve_many(
    state: &State,
    relation: &Relation,
    value: &Value,
    schemas: &SchemaMap,
    visited: &mut Visited,
    depth: usize,
) -> Value {
    let ids: Vec<ResourceId> = match value {
        Value::Array(entries) => entries.iter().filter_map(ResourceId::from_value).collect(),
        Value::String(list_name) => state
            .bucket(&relation.resource_type)
            .and_then(|bucket| bucket.lists.get(list_name))
            .cloned()
            .unwrap_or_default(),
        _ => return value.clone(),
    };

    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        if visited.contains(&(relation.resource_type.clone(), id.clone())) {
            resolved.push(id.to_value());
            continue;
        }
        if let Some(target) = state
            .bucket(&relation.resource_type)
            .and_then(|bucket| bucket.resources.get(&id))
        {
            resolved.push(
                resolve_inner(
                    state,
                    &relation.resource_type,
                    target,
                    schemas,
                    visited,
                    depth + 1,
                )
                .to_value(),
            );
        }
    }
    Value::Array(resolved)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::schema::{SchemaInputs, compile_all};
    use crate::types::TypeBucket;
    use serde_json::json;

    fn resource(value: serde_json::Value) -> Resource {
        Resource::from_value(&value).expect("object")
    }

    fn schemas(value: serde_json::Value) -> SchemaMap {
        let inputs: SchemaInputs = serde_json::from_value(value).expect("inputs");
        compile_all(&inputs, &MemorySink::new())
    }

    fn library_state() -> State {
        let mut books = TypeBucket::new();
        for value in [
            json!({ "id": 1, "name": "dune", "author": "a" }),
            json!({ "id": 2, "name": "leviathan", "author": "missing" }),
            json!({ "id": 3, "name": "anthology", "contributors": ["a", "b", "zz"] }),
        ] {
            let r = resource(value);
            let id = r.id_with("id").expect("id");
            books.resources.insert(id, r);
        }

        let mut authors = TypeBucket::new();
        for value in [
            json!({ "id": "a", "name": "frank" }),
            json!({ "id": "b", "name": "thomas" }),
        ] {
            let r = resource(value);
            let id = r.id_with("id").expect("id");
            authors.resources.insert(id, r);
        }
        authors
            .lists
            .insert("active".to_string(), vec![ResourceId::from("b")]);

        let mut state = State::new();
        state.insert_bucket("books", books);
        state.insert_bucket("authors", authors);
        state
    }

    fn library_schemas() -> SchemaMap {
        schemas(json!({
            "books": {
                "relations": {
                    "author": { "resource_type": "authors", "cardinality": "one" },
                    "contributors": { "resource_type": "authors", "cardinality": "many" }
                }
            }
        }))
    }

    #[test]
    fn no_relations_round_trips() {
        let state = library_state();
        let raw = resource(json!({ "id": 9, "name": "plain", "tags": [1, 2] }));

        let resolved = resolve_resource(&state, "books", &raw, &SchemaMap::new());
        assert_eq!(resolved, raw);
    }

    #[test]
    fn to_one_relation_inlines_the_target() {
        let state = library_state();
        let raw = state
            .bucket("books")
            .and_then(|b| b.resources.get(&ResourceId::Int(1)))
            .cloned()
            .expect("book 1");

        let resolved = resolve_resource(&state, "books", &raw, &library_schemas());

        assert_eq!(
            resolved.get("author"),
            Some(&json!({ "id": "a", "name": "frank" }))
        );
        // The stored resource still holds the bare identifier.
        assert_eq!(raw.get("author"), Some(&json!("a")));
    }

    #[test]
    fn to_one_missing_target_becomes_null() {
        let state = library_state();
        let raw = state
            .bucket("books")
            .and_then(|b| b.resources.get(&ResourceId::Int(2)))
            .cloned()
            .expect("book 2");

        let resolved = resolve_resource(&state, "books", &raw, &library_schemas());
        assert_eq!(resolved.get("author"), Some(&Value::Null));
    }

    #[test]
    fn to_many_omits_missing_members() {
        let state = library_state();
        let raw = state
            .bucket("books")
            .and_then(|b| b.resources.get(&ResourceId::Int(3)))
            .cloned()
            .expect("book 3");

        let resolved = resolve_resource(&state, "books", &raw, &library_schemas());
        assert_eq!(
            resolved.get("contributors"),
            Some(&json!([
                { "id": "a", "name": "frank" },
                { "id": "b", "name": "thomas" }
            ]))
        );
    }

    #[test]
    fn to_many_accepts_a_target_list_name() {
        let state = library_state();
        let raw = resource(json!({ "id": 4, "contributors": "active" }));

        let resolved = resolve_resource(&state, "books", &raw, &library_schemas());
        assert_eq!(
            resolved.get("contributors"),
            Some(&json!([{ "id": "b", "name": "thomas" }]))
        );
    }

    #[test]
    fn to_many_unknown_list_name_expands_to_empty() {
        let state = library_state();
        let raw = resource(json!({ "id": 4, "contributors": "retired" }));

        let resolved = resolve_resource(&state, "books", &raw, &library_schemas());
        assert_eq!(resolved.get("contributors"), Some(&json!([])));
    }

    #[test]
    fn mutual_relations_short_circuit_to_raw_identifiers() {
        let mut books = TypeBucket::new();
        let book = resource(json!({ "id": 1, "author": "a" }));
        books.resources.insert(ResourceId::Int(1), book);

        let mut authors = TypeBucket::new();
        let author = resource(json!({ "id": "a", "favorite": 1 }));
        authors.resources.insert(ResourceId::from("a"), author);

        let mut state = State::new();
        state.insert_bucket("books", books);
        state.insert_bucket("authors", authors);

        let schemas = schemas(json!({
            "books": {
                "relations": {
                    "author": { "resource_type": "authors", "cardinality": "one" }
                }
            },
            "authors": {
                "relations": {
                    "favorite": { "resource_type": "books", "cardinality": "one" }
                }
            }
        }));

        let raw = state
            .bucket("books")
            .and_then(|b| b.resources.get(&ResourceId::Int(1)))
            .cloned()
            .expect("book 1");
        let resolved = resolve_resource(&state, "books", &raw, &schemas);

        // books/1 -> authors/a resolves; authors/a -> books/1 repeats the
        // pair and stays a raw identifier.
        assert_eq!(
            resolved.get("author"),
            Some(&json!({ "id": "a", "favorite": 1 }))
        );
    }

    #[test]
    fn sibling_branches_resolve_independently() {
        // Two to-one fields referencing the same target: the visited set
        // tracks the current chain only, so both branches inline.
        let mut books = TypeBucket::new();
        books.resources.insert(
            ResourceId::Int(1),
            resource(json!({ "id": 1, "author": "a", "editor": "a" })),
        );
        let mut authors = TypeBucket::new();
        authors
            .resources
            .insert(ResourceId::from("a"), resource(json!({ "id": "a" })));

        let mut state = State::new();
        state.insert_bucket("books", books);
        state.insert_bucket("authors", authors);

        let schemas = schemas(json!({
            "books": {
                "relations": {
                    "author": { "resource_type": "authors", "cardinality": "one" },
                    "editor": { "resource_type": "authors", "cardinality": "one" }
                }
            }
        }));

        let raw = state
            .bucket("books")
            .and_then(|b| b.resources.get(&ResourceId::Int(1)))
            .cloned()
            .expect("book 1");
        let resolved = resolve_resource(&state, "books", &raw, &schemas);

        assert_eq!(resolved.get("author"), Some(&json!({ "id": "a" })));
        assert_eq!(resolved.get("editor"), Some(&json!({ "id": "a" })));
    }
}
