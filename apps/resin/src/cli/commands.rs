//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command follows the same shape: load the snapshot and schemas,
//! run one operation against the core with a capturing diagnostic sink,
//! print or write the result, then surface the captured diagnostics
//! (fatally, under `--strict`).

use resin_core::{
    DiagnosticSink, Filter, LogSink, MemorySink, ReadOptions, ResinError, ResourceId,
    SchemaInputs, State, Store, StoreOptions,
};
use serde_json::Value;
use std::path::Path;
use std::rc::Rc;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum snapshot size (100 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_SNAPSHOT_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), ResinError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| ResinError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(ResinError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

// =============================================================================
// LOADING
// =============================================================================

fn load_state(path: &Path) -> Result<State, ResinError> {
    validate_file_size(path, MAX_SNAPSHOT_SIZE)?;
    let text = std::fs::read_to_string(path)
        .map_err(|e| ResinError::IoError(format!("Cannot read '{}': {}", path.display(), e)))?;
    serde_json::from_str(&text).map_err(|e| {
        ResinError::DeserializationError(format!("Invalid snapshot '{}': {}", path.display(), e))
    })
}

fn load_schemas(path: Option<&Path>) -> Result<SchemaInputs, ResinError> {
    let Some(path) = path else {
        return Ok(SchemaInputs::new());
    };
    validate_file_size(path, MAX_SNAPSHOT_SIZE)?;
    let text = std::fs::read_to_string(path)
        .map_err(|e| ResinError::IoError(format!("Cannot read '{}': {}", path.display(), e)))?;
    toml::from_str(&text).map_err(|e| {
        ResinError::DeserializationError(format!("Invalid schemas '{}': {}", path.display(), e))
    })
}

/// Load the snapshot and schemas into a store with a capturing sink.
pub fn open_store(
    state_path: &Path,
    schemas_path: Option<&Path>,
) -> Result<(Store, Rc<MemorySink>), ResinError> {
    let state = load_state(state_path)?;
    let schemas = load_schemas(schemas_path)?;
    let sink = Rc::new(MemorySink::new());
    let store = Store::new(
        state,
        StoreOptions {
            schemas,
            sink: Some(Box::new(Rc::clone(&sink))),
        },
    );
    Ok((store, sink))
}

/// Forward captured diagnostics to the log; fail under `--strict`.
fn finish(sink: &MemorySink, strict: bool) -> Result<(), ResinError> {
    let warnings = sink.warnings();
    for warning in &warnings {
        LogSink.emit(warning.clone());
    }
    if strict && !warnings.is_empty() {
        return Err(ResinError::Diagnostics {
            count: warnings.len(),
        });
    }
    Ok(())
}

fn write_or_print(value: &Value, output: Option<&Path>) -> Result<(), ResinError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ResinError::SerializationError(e.to_string()))?;
    match output {
        Some(path) => std::fs::write(path, text).map_err(|e| {
            ResinError::IoError(format!("Cannot write '{}': {}", path.display(), e))
        }),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// Print the snapshot, or one type's bucket.
pub fn cmd_show(
    state_path: &Path,
    schemas_path: Option<&Path>,
    resource_type: Option<&str>,
    strict: bool,
) -> Result<(), ResinError> {
    let (store, sink) = open_store(state_path, schemas_path)?;

    let value = match resource_type {
        Some(resource_type) => store
            .state()
            .bucket(resource_type)
            .map(|bucket| serde_json::to_value(bucket))
            .transpose()
            .map_err(|e| ResinError::SerializationError(e.to_string()))?
            .unwrap_or(Value::Null),
        None => serde_json::to_value(store.state())
            .map_err(|e| ResinError::SerializationError(e.to_string()))?,
    };
    write_or_print(&value, None)?;

    finish(&sink, strict)
}

// =============================================================================
// GET COMMAND
// =============================================================================

/// Filter and shape arguments for a read.
#[derive(Debug, Default)]
pub struct GetArgs {
    /// Comma-separated identifier filter.
    pub ids: Option<String>,
    /// Partial-object filter (JSON text).
    pub matches: Option<String>,
    /// Skip relation expansion.
    pub raw: bool,
    /// Key the output by identifier.
    pub by_id: bool,
}

/// Run a read against an open store and shape the output.
pub fn read_resources(
    store: &Store,
    resource_type: &str,
    args: &GetArgs,
    sink: &Rc<MemorySink>,
) -> Result<Value, ResinError> {
    let filter = match (&args.ids, &args.matches) {
        (Some(ids), _) => Some(Filter::ids(
            ids.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(ResourceId::from),
        )),
        (None, Some(matches)) => {
            let value: Value = serde_json::from_str(matches).map_err(|e| {
                ResinError::DeserializationError(format!("Invalid --matches filter: {}", e))
            })?;
            Filter::from_value(&value, sink.as_ref())
        }
        (None, None) => None,
    };

    let options = if args.raw {
        ReadOptions::raw()
    } else {
        ReadOptions::default()
    };

    let value = if args.by_id {
        serde_json::to_value(store.get_resources_by_id(resource_type, filter.as_ref(), &options))
    } else {
        serde_json::to_value(store.get_resources(resource_type, filter.as_ref(), &options))
    };
    value.map_err(|e| ResinError::SerializationError(e.to_string()))
}

/// Read a type's resources and print them.
pub fn cmd_get(
    state_path: &Path,
    schemas_path: Option<&Path>,
    resource_type: &str,
    args: &GetArgs,
    strict: bool,
) -> Result<(), ResinError> {
    let (store, sink) = open_store(state_path, schemas_path)?;

    let value = read_resources(&store, resource_type, args, &sink)?;
    write_or_print(&value, None)?;

    finish(&sink, strict)
}

// =============================================================================
// WRITE COMMANDS
// =============================================================================

fn parse_changes(changes: &str) -> Result<Value, ResinError> {
    serde_json::from_str(changes)
        .map_err(|e| ResinError::DeserializationError(format!("Invalid changes payload: {}", e)))
}

fn emit_snapshot(store: &Store, output: Option<&Path>) -> Result<(), ResinError> {
    let value = serde_json::to_value(store.state())
        .map_err(|e| ResinError::SerializationError(e.to_string()))?;
    write_or_print(&value, output)
}

/// Apply an update and print or write the new snapshot.
pub fn cmd_update(
    state_path: &Path,
    schemas_path: Option<&Path>,
    target: &str,
    changes: &str,
    output: Option<&Path>,
    strict: bool,
) -> Result<(), ResinError> {
    let (mut store, sink) = open_store(state_path, schemas_path)?;

    let payload = parse_changes(changes)?;
    store.update(target, &payload);
    emit_snapshot(&store, output)?;

    finish(&sink, strict)
}

/// Apply deletions and print or write the new snapshot.
pub fn cmd_delete(
    state_path: &Path,
    schemas_path: Option<&Path>,
    target: &str,
    changes: &str,
    output: Option<&Path>,
    strict: bool,
) -> Result<(), ResinError> {
    let (mut store, sink) = open_store(state_path, schemas_path)?;

    let payload = parse_changes(changes)?;
    store.delete(target, &payload);
    emit_snapshot(&store, output)?;

    finish(&sink, strict)
}
