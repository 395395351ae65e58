//! # Store
//!
//! The top-level wrapper that owns the current state, the compiled
//! schemas, and the observer registry, and routes reads and writes
//! through the engines.
//!
//! The store serializes calls into the change engine by construction
//! (`&mut self`), and every write publishes a brand-new state tree, so
//! readers holding a previous snapshot never observe a partial write.
//! Listeners run after each write commits, update and delete alike.

use crate::change::{ChangeEngine, DeleteChanges, UpdateChanges};
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::filter::Filter;
use crate::path;
use crate::query::{self, ReadOptions};
use crate::schema::{self, SchemaInputs, SchemaMap};
use crate::types::{Resource, ResourceId, State};
use indexmap::IndexMap;
use serde_json::Value;

// =============================================================================
// OPTIONS
// =============================================================================

/// Construction options for a [`Store`].
#[derive(Default)]
pub struct StoreOptions {
    /// Raw schema configuration, compiled once at construction.
    pub schemas: SchemaInputs,
    /// Diagnostic sink override; [`LogSink`] when unset.
    pub sink: Option<Box<dyn DiagnosticSink>>,
}

/// Handle returned by [`Store::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

type Listener = Box<dyn Fn(&State)>;

// =============================================================================
// STORE
// =============================================================================

/// An in-process, schema-aware normalized resource store.
pub struct Store {
    state: State,
    schemas: SchemaMap,
    sink: Box<dyn DiagnosticSink>,
    listeners: Vec<(SubscriberId, Listener)>,
    next_subscriber: u64,
}

impl Store {
    /// Create a store over an initial state.
    #[must_use]
    pub fn new(initial_state: State, options: StoreOptions) -> Self {
        let sink = options.sink.unwrap_or_else(|| Box::new(LogSink));
        let schemas = schema::compile_all(&options.schemas, sink.as_ref());
        Self {
            state: initial_state,
            schemas,
            sink,
            listeners: Vec::new(),
            next_subscriber: 0,
        }
    }

    /// Create a store with no schemas and default diagnostics.
    #[must_use]
    pub fn with_state(initial_state: State) -> Self {
        Self::new(initial_state, StoreOptions::default())
    }

    /// The current state snapshot.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// The compiled schemas.
    #[must_use]
    pub fn schemas(&self) -> &SchemaMap {
        &self.schemas
    }

    // -------------------------------------------------------------------------
    // SUBSCRIPTIONS
    // -------------------------------------------------------------------------

    /// Register a listener called with the new state after every write.
    pub fn subscribe(&mut self, listener: impl Fn(&State) + 'static) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber = self.next_subscriber.saturating_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Unsubscribing twice is a no-op.
    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.listeners.retain(|(existing, _)| *existing != id);
    }

    // -------------------------------------------------------------------------
    // READS
    // -------------------------------------------------------------------------

    /// Read a type's resources as an ordered sequence.
    #[must_use]
    pub fn get_resources(
        &self,
        resource_type: &str,
        filter: Option<&Filter>,
        options: &ReadOptions,
    ) -> Vec<Resource> {
        query::get_resources(
            &self.state,
            &self.schemas,
            resource_type,
            filter,
            options,
            self.sink.as_ref(),
        )
    }

    /// Read a type's resources keyed by identifier.
    #[must_use]
    pub fn get_resources_by_id(
        &self,
        resource_type: &str,
        filter: Option<&Filter>,
        options: &ReadOptions,
    ) -> IndexMap<ResourceId, Resource> {
        query::get_resources_by_id(
            &self.state,
            &self.schemas,
            resource_type,
            filter,
            options,
            self.sink.as_ref(),
        )
    }

    // -------------------------------------------------------------------------
    // WRITES
    // -------------------------------------------------------------------------

    /// Apply canonical update changes.
    pub fn update_resources(&mut self, changes: &UpdateChanges) {
        let next =
            ChangeEngine::apply_updates(&self.state, &self.schemas, changes, self.sink.as_ref());
        self.commit(next);
    }

    /// Apply canonical delete changes.
    pub fn delete_resources(&mut self, changes: &DeleteChanges) {
        let next =
            ChangeEngine::apply_deletes(&self.state, &self.schemas, changes, self.sink.as_ref());
        self.commit(next);
    }

    /// Shorthand update: a dotted target path plus a JSON payload.
    pub fn update(&mut self, target: &str, payload: &Value) {
        let changes = path::update_changes(target, payload, &self.schemas, self.sink.as_ref());
        self.update_resources(&changes);
    }

    /// Shorthand delete: a dotted target path plus a JSON payload.
    pub fn delete(&mut self, target: &str, payload: &Value) {
        let changes = path::delete_changes(target, payload, self.sink.as_ref());
        self.delete_resources(&changes);
    }

    fn commit(&mut self, next: State) {
        self.state = next;
        for (_, listener) in &self.listeners {
            listener(&self.state);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
