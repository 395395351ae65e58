//! # Core Type Definitions
//!
//! This module contains all core types for the Resin normalized store:
//! - Resource identifiers (`ResourceId`)
//! - Records (`Resource`) and per-type storage (`TypeBucket`)
//! - The immutable state tree (`State`)
//! - Error types (`ResinError`)
//!
//! ## Determinism Guarantees
//!
//! - Name-keyed maps (type names, list names) use `BTreeMap` for
//!   deterministic ordering
//! - Identifier-keyed resource maps use `IndexMap` so reads observe
//!   insertion order
//! - No floating-point values participate in identity or ordering

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// RESOURCE IDENTIFIERS
// =============================================================================

/// Identifier of a resource within its type's resource map.
///
/// Identifiers are strings or integers. A string that parses as an integer
/// is canonicalized to the integer form, so the JSON object key `"10"` and
/// the list entry `10` name the same resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceId {
    /// Numeric identifier.
    Int(i64),
    /// String identifier (does not parse as an integer).
    Str(String),
}

impl ResourceId {
    /// Extract an identifier from a JSON value.
    ///
    /// Returns `None` for values that cannot act as identifiers
    /// (objects, arrays, booleans, null, non-integer numbers).
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) => Some(Self::from(s.as_str())),
            _ => None,
        }
    }

    /// Render the identifier back as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Str(s) => Value::from(s.clone()),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) => Self::Int(n),
            Err(_) => Self::Str(s.to_string()),
        }
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct IdVisitor;

        impl serde::de::Visitor<'_> for IdVisitor {
            type Value = ResourceId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer resource identifier")
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<ResourceId, E> {
                Ok(ResourceId::Int(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<ResourceId, E> {
                i64::try_from(v)
                    .map(ResourceId::Int)
                    .map_err(|_| E::custom("integer identifier out of range"))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<ResourceId, E> {
                Ok(ResourceId::from(v))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

// =============================================================================
// RESOURCE
// =============================================================================

/// Field map underlying a [`Resource`]. Preserves insertion order.
pub type Fields = Map<String, Value>;

/// A single typed record: an ordered mapping of field name to JSON value.
///
/// Exactly one field acts as the identifier; which one is declared by the
/// type's schema (`id_property`, default `"id"`). Other fields may hold
/// relation references that the resolver inlines on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource {
    fields: Fields,
}

impl Resource {
    /// Create an empty resource.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing field map.
    #[must_use]
    pub fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    /// Interpret a JSON value as a resource. Only objects qualify.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self {
                fields: fields.clone(),
            }),
            _ => None,
        }
    }

    /// Read a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Write a field, replacing any previous value.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// The identifier stored under `id_property`, if present and valid.
    #[must_use]
    pub fn id_with(&self, id_property: &str) -> Option<ResourceId> {
        self.fields.get(id_property).and_then(ResourceId::from_value)
    }

    /// Shallow merge: fields of `incoming` overwrite, everything else is kept.
    pub fn merge_shallow(&mut self, incoming: &Resource) {
        for (field, value) in &incoming.fields {
            self.fields.insert(field.clone(), value.clone());
        }
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Render the resource as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl From<Fields> for Resource {
    fn from(fields: Fields) -> Self {
        Self { fields }
    }
}

// =============================================================================
// TYPE BUCKET
// =============================================================================

/// Map from identifier to stored resource, in insertion order.
pub type ResourceMap = IndexMap<ResourceId, Resource>;

/// Per-type storage: the resource map plus the named identifier lists.
///
/// A bucket is created implicitly the first time a change introduces data
/// for its type; it is emptied but never destroyed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeBucket {
    /// Stored resources keyed by identifier.
    #[serde(default)]
    pub resources: ResourceMap,
    /// Named ordered identifier sequences (views/query results).
    #[serde(default)]
    pub lists: BTreeMap<String, Vec<ResourceId>>,
}

impl TypeBucket {
    /// Create an empty bucket.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a resource with this identifier is stored.
    #[must_use]
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.resources.contains_key(id)
    }
}

// =============================================================================
// STATE
// =============================================================================

/// The immutable state tree: resource-type name to shared bucket.
///
/// Writes never mutate in place. The change engine clones the outer map
/// (cheap: per-bucket `Arc` clones) and replaces only the buckets it
/// touches, so readers holding a previous snapshot never observe a partial
/// write, and untouched buckets stay referentially identical across writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    buckets: BTreeMap<String, Arc<TypeBucket>>,
}

impl State {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a type's bucket.
    #[must_use]
    pub fn bucket(&self, resource_type: &str) -> Option<&Arc<TypeBucket>> {
        self.buckets.get(resource_type)
    }

    /// Insert or replace a bucket, taking ownership of a fresh value.
    pub fn insert_bucket(&mut self, resource_type: impl Into<String>, bucket: TypeBucket) {
        self.buckets.insert(resource_type.into(), Arc::new(bucket));
    }

    /// Number of type buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether the state holds no buckets at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Whether `self` and `other` share the same allocation for a type's
    /// bucket. This is the observable face of copy-on-write: types untouched
    /// by a change keep their allocation across writes.
    #[must_use]
    pub fn shares_bucket(&self, other: &State, resource_type: &str) -> bool {
        match (self.bucket(resource_type), other.bucket(resource_type)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors surfaced by the store's outer boundary.
///
/// The engines themselves never fail on data-shape problems; they degrade
/// to safe defaults and report through the diagnostic channel. These
/// variants exist for callers that load snapshots, parse configuration,
/// or escalate diagnostics.
#[derive(Debug, Error)]
pub enum ResinError {
    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// An operation emitted diagnostics and the caller demanded none.
    #[error("Operation emitted {count} diagnostic(s)")]
    Diagnostics {
        /// How many warnings the operation produced.
        count: usize,
    },
}

// =============================================================================
// TESTS
// =============================================================================
