//! # Schema Registry
//!
//! Compiles raw per-type schema configuration into the normalized
//! [`Schema`] objects threaded through every read and write.
//!
//! Compilation performs no cross-type validation: relation targets are
//! resolved lazily by name at read time, so declaring a relation to a type
//! that is never registered is legal. The only structural requirement is
//! that a declared relation names its target type and cardinality; inputs
//! that fail it are reported and replaced by the default schema.

use crate::diagnostics::{self, DiagnosticSink, codes};
use crate::types::{Resource, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Identifier field used when a schema does not name one.
pub const DEFAULT_ID_PROPERTY: &str = "id";

static DEFAULT_SCHEMA: LazyLock<Schema> = LazyLock::new(Schema::default);

// =============================================================================
// SCHEMA
// =============================================================================

/// How many resources a relation field references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// The field holds a single identifier.
    One,
    /// The field holds a sequence of identifiers, or names a list of the
    /// target type.
    Many,
}

/// A declared relation from one resource type's field to another type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Name of the referenced resource type.
    pub resource_type: String,
    /// Whether the field references one resource or many.
    pub cardinality: Cardinality,
}

/// Compiled per-type schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    /// Field holding the resource identifier.
    pub id_property: String,
    /// Relation declarations keyed by field name.
    pub relations: BTreeMap<String, Relation>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            id_property: DEFAULT_ID_PROPERTY.to_string(),
            relations: BTreeMap::new(),
        }
    }
}

impl Schema {
    /// Identifier of a resource under this schema, if present.
    #[must_use]
    pub fn id_of(&self, resource: &Resource) -> Option<ResourceId> {
        resource.id_with(&self.id_property)
    }

    /// The relation declared for a field, if any.
    #[must_use]
    pub fn relation(&self, field: &str) -> Option<&Relation> {
        self.relations.get(field)
    }
}

/// Compiled schemas keyed by resource-type name.
pub type SchemaMap = BTreeMap<String, Schema>;

/// The schema for a type, falling back to the default schema for types
/// with no declared entry.
#[must_use]
pub fn for_type<'a>(schemas: &'a SchemaMap, resource_type: &str) -> &'a Schema {
    schemas.get(resource_type).unwrap_or(&DEFAULT_SCHEMA)
}

// =============================================================================
// RAW INPUT
// =============================================================================

/// Raw schema configuration for one resource type, as written by the user
/// (TOML or JSON). Every option may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchemaInput {
    /// Identifier field; `"id"` when unspecified.
    pub id_property: Option<String>,
    /// Relation declarations keyed by field name.
    pub relations: Option<BTreeMap<String, RelationInput>>,
}

/// Raw relation declaration. Both parts are required for the declaration
/// to be usable; compilation checks, not deserialization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RelationInput {
    /// Target resource type.
    pub resource_type: Option<String>,
    /// Relation cardinality.
    pub cardinality: Option<Cardinality>,
}

/// Raw schema configuration keyed by resource-type name.
pub type SchemaInputs = BTreeMap<String, SchemaInput>;

// =============================================================================
// COMPILATION
// =============================================================================

/// Compile one type's raw configuration.
///
/// A relation missing its target type or cardinality makes the whole input
/// unusable: the failure is reported with `SCHEMA_INVALID_RELATION` and the
/// type gets the default schema instead. Compilation itself never fails.
#[must_use]
pub fn compile(resource_type: &str, input: &SchemaInput, sink: &dyn DiagnosticSink) -> Schema {
    let mut relations = BTreeMap::new();

    if let Some(raw_relations) = &input.relations {
        for (field, raw) in raw_relations {
            match (&raw.resource_type, raw.cardinality) {
                (Some(target), Some(cardinality)) => {
                    relations.insert(
                        field.clone(),
                        Relation {
                            resource_type: target.clone(),
                            cardinality,
                        },
                    );
                }
                _ => {
                    diagnostics::error(
                        sink,
                        codes::SCHEMA_INVALID_RELATION,
                        format!(
                            "Relation '{field}' of resource type '{resource_type}' must name \
                             a resource type and a cardinality. Falling back to the default \
                             schema for '{resource_type}'."
                        ),
                    );
                    return Schema::default();
                }
            }
        }
    }

    Schema {
        id_property: input
            .id_property
            .clone()
            .unwrap_or_else(|| DEFAULT_ID_PROPERTY.to_string()),
        relations,
    }
}

/// Compile the full registry. Consumed once at store construction.
#[must_use]
pub fn compile_all(inputs: &SchemaInputs, sink: &dyn DiagnosticSink) -> SchemaMap {
    inputs
        .iter()
        .map(|(resource_type, input)| (resource_type.clone(), compile(resource_type, input, sink)))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
