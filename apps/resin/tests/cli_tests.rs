//! Integration tests for the Resin CLI commands.
//!
//! Commands run against real snapshot and schema files in a temp
//! directory, without going through a spawned process.

use resin::cli::{GetArgs, cmd_delete, cmd_update, open_store, read_resources};
use resin_core::{ResinError, ResourceId, State};
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// FIXTURES
// =============================================================================

fn snapshot() -> serde_json::Value {
    json!({
        "books": {
            "lists": {
                "favorites": [2, 5],
                "new": [1, 5, 10]
            },
            "resources": {
                "1": { "id": 1, "name": "dune", "author": "a" },
                "2": { "id": 2, "name": "leviathan" },
                "5": { "id": 5, "name": "solaris" },
                "10": { "id": 10, "name": "ubik" }
            }
        },
        "authors": {
            "lists": {},
            "resources": {
                "a": { "id": "a", "name": "frank" }
            }
        }
    })
}

const SCHEMAS_TOML: &str = r#"
[books.relations.author]
resource_type = "authors"
cardinality = "one"
"#;

struct Fixture {
    _dir: TempDir,
    state: PathBuf,
    schemas: PathBuf,
    output: PathBuf,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let state = dir.path().join("state.json");
    let schemas = dir.path().join("schemas.toml");
    let output = dir.path().join("out.json");

    std::fs::write(&state, snapshot().to_string()).expect("write state");
    std::fs::write(&schemas, SCHEMAS_TOML).expect("write schemas");

    Fixture {
        _dir: dir,
        state,
        schemas,
        output,
    }
}

fn reload(path: &PathBuf) -> State {
    let text = std::fs::read_to_string(path).expect("read output");
    serde_json::from_str(&text).expect("parse output")
}

// =============================================================================
// READS
// =============================================================================

#[test]
fn get_expands_relations_from_the_schema_file() {
    let f = fixture();
    let (store, sink) = open_store(&f.state, Some(&f.schemas)).expect("open");

    let value = read_resources(
        &store,
        "books",
        &GetArgs {
            ids: Some("1".to_string()),
            ..GetArgs::default()
        },
        &sink,
    )
    .expect("read");

    assert_eq!(
        value,
        json!([{ "id": 1, "name": "dune", "author": { "id": "a", "name": "frank" } }])
    );
    assert!(sink.is_empty());
}

#[test]
fn get_raw_skips_expansion() {
    let f = fixture();
    let (store, sink) = open_store(&f.state, Some(&f.schemas)).expect("open");

    let value = read_resources(
        &store,
        "books",
        &GetArgs {
            ids: Some("1".to_string()),
            raw: true,
            ..GetArgs::default()
        },
        &sink,
    )
    .expect("read");

    assert_eq!(value, json!([{ "id": 1, "name": "dune", "author": "a" }]));
}

#[test]
fn get_by_id_keys_the_output() {
    let f = fixture();
    let (store, sink) = open_store(&f.state, None).expect("open");

    let value = read_resources(
        &store,
        "books",
        &GetArgs {
            ids: Some("5,2".to_string()),
            raw: true,
            by_id: true,
            ..GetArgs::default()
        },
        &sink,
    )
    .expect("read");

    assert_eq!(
        value,
        json!({
            "5": { "id": 5, "name": "solaris" },
            "2": { "id": 2, "name": "leviathan" }
        })
    );
}

#[test]
fn get_matches_filters_structurally() {
    let f = fixture();
    let (store, sink) = open_store(&f.state, None).expect("open");

    let value = read_resources(
        &store,
        "books",
        &GetArgs {
            matches: Some(r#"{"name":"ubik"}"#.to_string()),
            ..GetArgs::default()
        },
        &sink,
    )
    .expect("read");

    assert_eq!(value, json!([{ "id": 10, "name": "ubik" }]));
}

// =============================================================================
// WRITES
// =============================================================================

#[test]
fn update_writes_the_new_snapshot() {
    let f = fixture();

    cmd_update(
        &f.state,
        Some(&f.schemas),
        "books.resources.24",
        r#"{"name":"hyperion"}"#,
        Some(&f.output),
        true,
    )
    .expect("update");

    let state = reload(&f.output);
    let books = state.bucket("books").expect("books");
    assert!(books.contains(&ResourceId::Int(24)));
    assert_eq!(
        books
            .resources
            .get(&ResourceId::Int(24))
            .and_then(|r| r.get("name")),
        Some(&json!("hyperion"))
    );
    // Untouched data survives the round trip.
    assert_eq!(books.resources.len(), 5);
}

#[test]
fn delete_cascades_through_the_snapshot() {
    let f = fixture();

    cmd_delete(
        &f.state,
        None,
        "books.resources.10",
        "null",
        Some(&f.output),
        true,
    )
    .expect("delete");

    let state = reload(&f.output);
    let books = state.bucket("books").expect("books");
    assert!(!books.contains(&ResourceId::Int(10)));
    assert_eq!(
        books.lists.get("new"),
        Some(&vec![ResourceId::Int(1), ResourceId::Int(5)])
    );
    assert_eq!(
        books.lists.get("favorites"),
        Some(&vec![ResourceId::Int(2), ResourceId::Int(5)])
    );
}

// =============================================================================
// FAILURE MODES
// =============================================================================

#[test]
fn strict_mode_escalates_diagnostics() {
    let f = fixture();
    let (store, sink) = open_store(&f.state, None).expect("open");

    // An unknown type degrades to an empty read and a diagnostic.
    let value = read_resources(&store, "ghosts", &GetArgs::default(), &sink).expect("read");
    assert_eq!(value, json!([]));
    assert_eq!(sink.len(), 1);

    // The command surface turns that into a strict-mode failure.
    let err = cmd_delete(&f.state, None, "books.nope", "null", None, true);
    assert!(matches!(err, Err(ResinError::Diagnostics { count: 1 })));
}

#[test]
fn missing_snapshot_is_an_io_error() {
    let f = fixture();
    let missing = f.state.with_file_name("missing.json");

    let err = open_store(&missing, None);
    assert!(matches!(err, Err(ResinError::IoError(_))));
}

#[test]
fn malformed_snapshot_is_a_deserialization_error() {
    let f = fixture();
    std::fs::write(&f.state, "{ not json").expect("write");

    let err = open_store(&f.state, None);
    assert!(matches!(err, Err(ResinError::DeserializationError(_))));
}
