//! # Scenario Tests
//!
//! End-to-end behavior through the store wrapper: cascades, list
//! deletion forms, bulk multi-type changes, and quiet no-ops.

use resin_core::{
    ChangeEngine, DeleteChanges, ListDeletion, MemorySink, ReadOptions, Resource, ResourceId,
    SchemaMap, State, Store, StoreOptions, TypeDeletions,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::rc::Rc;

fn library_state() -> State {
    serde_json::from_value(json!({
        "books": {
            "lists": {
                "favorites": [2, 5],
                "new": [1, 5, 10]
            },
            "resources": {
                "2": { "id": 2 },
                "5": { "id": 5 },
                "10": { "id": 10 }
            }
        },
        "authors": {
            "lists": {
                "things": [10]
            },
            "resources": {
                "a": { "id": "a" },
                "b": { "id": "b" }
            }
        }
    }))
    .expect("state")
}

fn library_store() -> (Store, Rc<MemorySink>) {
    let sink = Rc::new(MemorySink::new());
    let store = Store::new(
        library_state(),
        StoreOptions {
            schemas: resin_core::SchemaInputs::new(),
            sink: Some(Box::new(Rc::clone(&sink))),
        },
    );
    (store, sink)
}

fn ids(raw: &[i64]) -> Vec<ResourceId> {
    raw.iter().copied().map(ResourceId::Int).collect()
}

#[test]
fn deleting_a_resource_cascades_into_unnamed_lists() {
    let (mut store, sink) = library_store();

    store.delete("books.resources", &json!([10]));

    let books = store.state().bucket("books").expect("books");
    assert_eq!(books.lists.get("new"), Some(&ids(&[1, 5])));
    assert_eq!(books.lists.get("favorites"), Some(&ids(&[2, 5])));
    assert!(!books.contains(&ResourceId::Int(10)));

    // The other type is untouched, dangling member and all.
    let authors = store.state().bucket("authors").expect("authors");
    assert_eq!(authors.lists.get("things"), Some(&ids(&[10])));
    assert_eq!(authors.resources.len(), 2);
    assert!(sink.is_empty());
}

#[test]
fn deleting_a_list_by_name_leaves_resources_untouched() {
    let (mut store, sink) = library_store();

    store.delete("books.lists", &json!(["new"]));

    let books = store.state().bucket("books").expect("books");
    assert!(!books.lists.contains_key("new"));
    assert_eq!(books.lists.get("favorites"), Some(&ids(&[2, 5])));
    assert_eq!(books.resources.len(), 3);
    assert!(sink.is_empty());
}

#[test]
fn null_deletes_a_list_but_empty_clears_it() {
    let (mut store, sink) = library_store();

    store.delete("books.lists", &json!({ "new": null, "favorites": [] }));

    let books = store.state().bucket("books").expect("books");
    // `null` deletes the list outright...
    assert!(!books.lists.contains_key("new"));
    // ...while `[]` keeps the key and empties the membership.
    assert_eq!(books.lists.get("favorites"), Some(&Vec::new()));
    assert_eq!(books.resources.len(), 3);
    assert!(sink.is_empty());
}

#[test]
fn bulk_changes_span_types_in_one_call() {
    let (mut store, sink) = library_store();

    let changes = DeleteChanges::from([
        (
            "books".to_string(),
            TypeDeletions {
                resources: vec![
                    Resource::from_value(&json!({ "id": 2 })).expect("object").into(),
                    ResourceId::Int(5).into(),
                ],
                lists: BTreeMap::from([("new".to_string(), ListDeletion::Drop)]),
            },
        ),
        (
            "authors".to_string(),
            TypeDeletions {
                resources: vec![ResourceId::from("a").into()],
                lists: BTreeMap::from([("things".to_string(), ListDeletion::Drop)]),
            },
        ),
    ]);
    store.delete_resources(&changes);

    let books = store.state().bucket("books").expect("books");
    assert_eq!(books.lists.get("favorites"), Some(&Vec::new()));
    assert!(!books.lists.contains_key("new"));
    assert_eq!(
        books.resources.keys().cloned().collect::<Vec<_>>(),
        vec![ResourceId::Int(10)]
    );

    let authors = store.state().bucket("authors").expect("authors");
    assert!(authors.lists.is_empty());
    assert_eq!(
        authors.resources.keys().cloned().collect::<Vec<_>>(),
        vec![ResourceId::from("b")]
    );
    assert!(sink.is_empty());
}

#[test]
fn unmatched_changes_are_quiet_no_ops() {
    let (mut store, sink) = library_store();
    let before = store.state().clone();

    store.delete("sandwiches.resources", &json!([1]));
    store.delete("books.resources", &json!([100]));
    store.delete("books.lists", &json!(["blah"]));

    assert_eq!(store.state(), &before);
    assert!(store.state().shares_bucket(&before, "books"));
    assert!(store.state().shares_bucket(&before, "authors"));
    assert!(sink.is_empty());
}

#[test]
fn narrowing_a_list_touches_nothing_else() {
    let (mut store, sink) = library_store();

    store.delete("books.lists.favorites", &json!([2]));

    let books = store.state().bucket("books").expect("books");
    assert_eq!(books.lists.get("favorites"), Some(&ids(&[5])));
    assert_eq!(books.lists.get("new"), Some(&ids(&[1, 5, 10])));
    assert_eq!(books.resources.len(), 3);
    assert!(sink.is_empty());
}

#[test]
fn plain_resources_read_back_unchanged() {
    let (store, sink) = library_store();

    let books = store.get_resources("books", None, &ReadOptions::default());

    // No declared relations: resolution is the identity.
    assert_eq!(
        books.iter().filter_map(|r| r.id_with("id")).collect::<Vec<_>>(),
        ids(&[2, 5, 10])
    );
    assert_eq!(books[0].to_value(), json!({ "id": 2 }));
    assert!(sink.is_empty());
}

#[test]
fn delete_then_reread_respects_the_new_state() {
    let (mut store, sink) = library_store();

    store.delete("books.resources.5", &json!(null));

    let remaining = store.get_resources_by_id("books", None, &ReadOptions::default());
    assert_eq!(
        remaining.keys().cloned().collect::<Vec<_>>(),
        ids(&[2, 10])
    );

    // A snapshot taken before the write would still show the old world;
    // the engine never mutates in place.
    let fresh = ChangeEngine::apply_deletes(
        &library_state(),
        &SchemaMap::new(),
        &DeleteChanges::new(),
        &MemorySink::new(),
    );
    assert_eq!(fresh, library_state());
    assert!(sink.is_empty());
}
