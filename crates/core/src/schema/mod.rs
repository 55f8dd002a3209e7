//! Declarative entity metadata.
//!
//! Each configuration entity is described once, as a static [`EntitySchema`]
//! listing its fields in wire order. The codec walks values against these
//! descriptions, so supporting a new entity means adding metadata here rather
//! than writing another decoder.

pub mod entities;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// How strictly a document is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Object-model checking: [`Requirement::Strict`] fields are optional.
    #[default]
    Permissive,
    /// Schema-model checking: [`Requirement::Strict`] fields are required.
    Strict,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permissive => f.write_str("permissive"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

/// Whether a field must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Requirement {
    /// Required in every mode.
    Required,
    /// Required only in [`Mode::Strict`].
    Strict,
    /// Never required.
    Optional,
}

impl Requirement {
    /// Whether absence is an error under `mode`.
    #[must_use]
    pub const fn is_required(self, mode: Mode) -> bool {
        match self {
            Self::Required => true,
            Self::Strict => matches!(mode, Mode::Strict),
            Self::Optional => false,
        }
    }
}

/// Treatment of keys an entity does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Openness {
    /// Unknown keys are rejected in both modes.
    Closed,
    /// Unknown keys are kept as additional properties.
    Open,
}

/// Target shape of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Any value, kept verbatim.
    Any,
    /// `true` or `false`.
    Bool,
    /// Any number.
    Number,
    /// A whole number that fits in an `i64`.
    Integer,
    /// A whole number from 0 to `u32::MAX`.
    Count,
    /// A string.
    String,
    /// A string from a fixed set.
    Choice(&'static [&'static str]),
    /// One string or a list of strings.
    StringList,
    /// A list whose elements share a shape.
    ListOf(&'static Shape),
    /// A map from names to values sharing a shape.
    MapOf(&'static Shape),
    /// A nested entity.
    Entity(&'static EntitySchema),
    /// A bare name, or a nested entity carrying the name plus parameters.
    NameOrEntity(&'static EntitySchema),
    /// A job step, resolved by marker key.
    Step,
    /// A workflow job entry: a job name or a single-key map.
    WorkflowJob,
    /// Orb imports, as a list of entries or an alias map.
    OrbImports,
}

impl Shape {
    /// Short description used in mismatch errors and schema listings.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Any => "any".to_string(),
            Self::Bool => "boolean".to_string(),
            Self::Number => "number".to_string(),
            Self::Integer => "integer".to_string(),
            Self::Count => "non-negative 32-bit integer".to_string(),
            Self::String => "string".to_string(),
            Self::Choice(allowed) => format!("one of [{}]", allowed.join(", ")),
            Self::StringList => "string or list<string>".to_string(),
            Self::ListOf(inner) => format!("list<{}>", inner.describe()),
            Self::MapOf(inner) => format!("map<{}>", inner.describe()),
            Self::Entity(schema) => schema.name.to_string(),
            Self::NameOrEntity(schema) => format!("string or {}", schema.name),
            Self::Step => "step".to_string(),
            Self::WorkflowJob => "workflow job".to_string(),
            Self::OrbImports => "orb imports".to_string(),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl Serialize for Shape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One declared field of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Wire name.
    pub name: &'static str,
    /// Whether the field must be present.
    pub requirement: Requirement,
    /// Target shape.
    pub shape: Shape,
}

impl FieldSpec {
    /// A field required in every mode.
    #[must_use]
    pub const fn required(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            requirement: Requirement::Required,
            shape,
        }
    }

    /// A field required only in strict mode.
    #[must_use]
    pub const fn strict(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            requirement: Requirement::Strict,
            shape,
        }
    }

    /// An optional field.
    #[must_use]
    pub const fn optional(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            requirement: Requirement::Optional,
            shape,
        }
    }
}

/// Marks an entity whose executor keys are resolved polymorphically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutorSlot {
    /// Whether `executor: <name>` references are accepted.
    pub allow_reference: bool,
}

/// Static description of one entity.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct EntitySchema {
    /// Registry name.
    pub name: &'static str,
    /// One-line summary for schema listings.
    pub description: &'static str,
    /// Treatment of undeclared keys.
    pub openness: Openness,
    /// Executor keys handled before the declared fields, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor: Option<ExecutorSlot>,
    /// Declared fields, in wire order.
    pub fields: &'static [FieldSpec],
}

impl EntitySchema {
    /// Look up a declared field by wire name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Whether `key` is a declared field.
    #[must_use]
    pub fn declares(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// Whether undeclared keys are kept.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.openness, Openness::Open)
    }

    /// Fields that must be present under `mode`.
    pub fn required_fields(&self, mode: Mode) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields
            .iter()
            .filter(move |field| field.requirement.is_required(mode))
    }
}

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::builtin);

/// Index of every known entity schema, keyed by name.
///
/// Built once on first use and never mutated afterwards.
#[derive(Debug)]
pub struct Registry {
    entities: IndexMap<&'static str, &'static EntitySchema>,
}

impl Registry {
    /// The process-wide registry.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    fn builtin() -> Self {
        let entities = entities::ALL
            .iter()
            .map(|schema| (schema.name, *schema))
            .collect();
        Self { entities }
    }

    /// Look up an entity by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static EntitySchema> {
        self.entities.get(name).copied()
    }

    /// All entities, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &'static EntitySchema> + '_ {
        self.entities.values().copied()
    }

    /// Entity names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entities.keys().copied()
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
