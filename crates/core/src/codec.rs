//! Structural walker between generic values and typed entities.
//!
//! Decoding walks a [`Value`] against a [`Shape`], producing a canonical
//! value with the same content in declared key order, and then builds the
//! typed model from it with serde. Encoding serializes the typed model and
//! walks the result with the same shape. Both directions share one walker,
//! so they cannot disagree about what is valid.

use crate::error::{DecodeError, FieldPath, Result};
use crate::resolver::{self, EXECUTOR_KEYS, StepKind, StepVariant};
use crate::schema::{EntitySchema, ExecutorSlot, Openness, Shape, entities};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, trace};

pub use crate::schema::Mode;

/// A typed entity with registered metadata.
pub trait Entity: Serialize + DeserializeOwned {
    /// Metadata describing the entity's wire form.
    fn schema() -> &'static EntitySchema;
}

/// Build a typed value from a canonical value, keeping the failing path.
pub(crate) fn from_canonical<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_path_to_error::deserialize(value).map_err(|err| DecodeError::Serde {
        path: FieldPath::from(err.path()),
        message: err.into_inner().to_string(),
    })
}

/// Shape-directed decoder and encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Codec {
    mode: Mode,
}

impl Codec {
    /// Create a codec for `mode`.
    #[must_use]
    pub const fn new(mode: Mode) -> Self {
        Self { mode }
    }

    /// Strictness mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Decode an entity from a generic value.
    pub fn decode<T: Entity>(&self, value: &Value) -> Result<T> {
        self.decode_shape(value, &Shape::Entity(T::schema()))
    }

    /// Decode any deserializable value against an explicit shape.
    pub fn decode_shape<T: DeserializeOwned>(&self, value: &Value, shape: &Shape) -> Result<T> {
        let canonical = self.canonicalize(value, shape)?;
        from_canonical(canonical)
    }

    /// Encode an entity into a generic value in declared key order.
    pub fn encode<T: Entity>(&self, entity: &T) -> Result<Value> {
        self.encode_shape(entity, &Shape::Entity(T::schema()))
    }

    /// Encode any serializable value against an explicit shape.
    pub fn encode_shape<T: Serialize>(&self, value: &T, shape: &Shape) -> Result<Value> {
        let raw = serde_json::to_value(value).map_err(|err| DecodeError::Serde {
            path: FieldPath::root(),
            message: err.to_string(),
        })?;
        self.canonicalize(&raw, shape)
    }

    /// Check `value` against `shape` and return its canonical form.
    pub fn canonicalize(&self, value: &Value, shape: &Shape) -> Result<Value> {
        let mut path = FieldPath::root();
        self.walk(value, shape, &mut path)
    }

    fn walk(&self, value: &Value, shape: &Shape, path: &mut FieldPath) -> Result<Value> {
        match shape {
            Shape::Any => Ok(value.clone()),
            Shape::Bool => expect(value.is_boolean(), value, shape, path),
            Shape::Number => expect(value.is_number(), value, shape, path),
            Shape::Integer => expect(value.is_i64(), value, shape, path),
            Shape::Count => {
                let fits = value.as_u64().is_some_and(|n| u32::try_from(n).is_ok());
                expect(fits, value, shape, path)
            }
            Shape::String => expect(value.is_string(), value, shape, path),
            Shape::Choice(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => Ok(value.clone()),
                Some(s) => Err(DecodeError::UnsupportedValue {
                    path: path.clone(),
                    value: s.to_string(),
                    allowed: allowed.iter().map(|a| (*a).to_string()).collect(),
                }),
                None => Err(DecodeError::mismatch(path, "string", value)),
            },
            Shape::StringList => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Array(_) => self.walk(value, &Shape::ListOf(&Shape::String), path),
                other => Err(DecodeError::mismatch(path, shape.describe(), other)),
            },
            Shape::ListOf(inner) => {
                let Some(items) = value.as_array() else {
                    return Err(DecodeError::mismatch(path, "list", value));
                };
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    path.push_index(index);
                    out.push(self.walk(item, inner, path)?);
                    path.pop();
                }
                Ok(Value::Array(out))
            }
            Shape::MapOf(inner) => {
                let Some(entries) = value.as_object() else {
                    return Err(DecodeError::mismatch(path, "map", value));
                };
                let mut out = Map::with_capacity(entries.len());
                for (key, item) in entries {
                    path.push_key(key.as_str());
                    out.insert(key.clone(), self.walk(item, inner, path)?);
                    path.pop();
                }
                Ok(Value::Object(out))
            }
            Shape::Entity(schema) => self.walk_entity(value, schema, path),
            Shape::NameOrEntity(schema) => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Object(_) => self.walk_entity(value, schema, path),
                other => Err(DecodeError::mismatch(path, shape.describe(), other)),
            },
            Shape::Step => self.walk_step(value, path),
            Shape::WorkflowJob => self.walk_workflow_job(value, path),
            Shape::OrbImports => self.walk_orb_imports(value, path),
        }
    }

    fn walk_entity(
        &self,
        value: &Value,
        schema: &EntitySchema,
        path: &mut FieldPath,
    ) -> Result<Value> {
        let Some(object) = value.as_object() else {
            return Err(DecodeError::mismatch(path, "map", value));
        };
        trace!(entity = schema.name, %path, "walking entity");

        let mut out = Map::with_capacity(object.len());
        if let Some(slot) = schema.executor {
            self.walk_executor(object, slot, path, &mut out)?;
        }

        for field in schema.fields {
            match object.get(field.name) {
                Some(item) if !item.is_null() => {
                    path.push_key(field.name);
                    let canonical = self.walk(item, &field.shape, path)?;
                    path.pop();
                    out.insert(field.name.to_string(), canonical);
                }
                _ if field.requirement.is_required(self.mode) => {
                    return Err(DecodeError::missing(path, field.name));
                }
                _ => {}
            }
        }

        for (key, item) in object {
            if schema.declares(key) || slot_owns(schema.executor, key) {
                continue;
            }
            self.undeclared(schema, key, item, path, &mut out)?;
        }

        Ok(Value::Object(out))
    }

    fn undeclared(
        &self,
        schema: &EntitySchema,
        key: &str,
        item: &Value,
        path: &FieldPath,
        out: &mut Map<String, Value>,
    ) -> Result<()> {
        match schema.openness {
            Openness::Open => {
                out.insert(key.to_string(), item.clone());
                Ok(())
            }
            Openness::Closed => {
                debug!(entity = schema.name, %path, field = key, "rejecting unknown field");
                Err(DecodeError::UnknownField {
                    path: path.clone(),
                    field: key.to_string(),
                })
            }
        }
    }

    fn walk_executor(
        &self,
        object: &Map<String, Value>,
        slot: ExecutorSlot,
        path: &mut FieldPath,
        out: &mut Map<String, Value>,
    ) -> Result<()> {
        let variant = resolver::resolve_executor_variant(object, slot.allow_reference, path)?;
        let keys: Map<String, Value> = object
            .iter()
            .filter(|(key, _)| slot_owns(Some(slot), key))
            .map(|(key, item)| (key.clone(), item.clone()))
            .collect();

        let canonical = self.walk_entity(&Value::Object(keys), variant.schema(), path)?;
        if let Value::Object(entries) = canonical {
            out.extend(entries);
        }
        Ok(())
    }

    fn walk_step(&self, value: &Value, path: &mut FieldPath) -> Result<Value> {
        match resolver::resolve_step_variant(value, path)? {
            StepVariant::Reference(_) => Ok(value.clone()),
            StepVariant::Custom { name, body } => {
                // custom command parameters are not checked here
                let mut out = Map::with_capacity(1);
                out.insert(name.to_string(), body.clone());
                Ok(Value::Object(out))
            }
            StepVariant::Builtin { kind, body } => {
                path.push_key(kind.marker());
                let canonical = match body {
                    Value::String(_) if kind == StepKind::Run => body.clone(),
                    Value::Null => {
                        self.walk_entity(&Value::Object(Map::new()), kind.schema(), path)?
                    }
                    _ => self.walk_entity(body, kind.schema(), path)?,
                };
                path.pop();

                let mut out = Map::with_capacity(1);
                out.insert(kind.marker().to_string(), canonical);
                Ok(Value::Object(out))
            }
        }
    }

    fn walk_workflow_job(&self, value: &Value, path: &mut FieldPath) -> Result<Value> {
        let (name, body) = resolver::resolve_workflow_job(value, path)?;
        if body.is_null() {
            return Ok(Value::String(name.to_string()));
        }

        path.push_key(name);
        let canonical = self.walk_entity(body, &entities::WORKFLOW_JOB_PARAMETERS, path)?;
        path.pop();

        let mut out = Map::with_capacity(1);
        out.insert(name.to_string(), canonical);
        Ok(Value::Object(out))
    }

    /// Orb imports are canonicalized to the list form.
    fn walk_orb_imports(&self, value: &Value, path: &mut FieldPath) -> Result<Value> {
        match value {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    path.push_index(index);
                    out.push(self.walk_entity(item, &entities::ORB_IMPORT, path)?);
                    path.pop();
                }
                Ok(Value::Array(out))
            }
            Value::Object(aliases) => {
                let mut out = Vec::with_capacity(aliases.len());
                for (alias, import) in aliases {
                    let Some(import) = import.as_str() else {
                        let path = path.child(alias.as_str());
                        return Err(DecodeError::mismatch(&path, "string", import));
                    };
                    let mut entry = Map::with_capacity(2);
                    entry.insert("orbAlias".to_string(), Value::String(alias.clone()));
                    entry.insert("orbImport".to_string(), Value::String(import.to_string()));
                    out.push(Value::Object(entry));
                }
                Ok(Value::Array(out))
            }
            other => Err(DecodeError::mismatch(path, "list or map of orb imports", other)),
        }
    }
}

fn expect(ok: bool, value: &Value, shape: &Shape, path: &FieldPath) -> Result<Value> {
    if ok {
        Ok(value.clone())
    } else {
        Err(DecodeError::mismatch(path, shape.describe(), value))
    }
}

/// Whether `key` is consumed by the executor slot rather than the entity.
fn slot_owns(slot: Option<ExecutorSlot>, key: &str) -> bool {
    match slot {
        Some(slot) => EXECUTOR_KEYS.contains(&key) && (slot.allow_reference || key != "executor"),
        None => false,
    }
}
