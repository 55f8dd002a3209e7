//! Document-level validation entry points.

use crate::codec::{Codec, Mode};
use crate::error::Result;
use crate::model::Document;
use crate::schema::{EntitySchema, Shape};
use serde_json::Value;
use std::fmt;
use tracing::{debug, instrument, warn};

/// Result of validating one input.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The document is well-formed.
    Valid(Box<Document>),
    /// The document violates the schema.
    Invalid(crate::error::DecodeError),
    /// The input could not be parsed into a value tree.
    MalformedInput(String),
}

impl Outcome {
    /// Whether the document is well-formed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The validated document, if any.
    #[must_use]
    pub fn document(&self) -> Option<&Document> {
        match self {
            Self::Valid(document) => Some(document),
            _ => None,
        }
    }
}

/// Validates configuration documents in one strictness mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Validator {
    codec: Codec,
}

impl Validator {
    /// Create a validator for `mode`.
    #[must_use]
    pub const fn new(mode: Mode) -> Self {
        Self {
            codec: Codec::new(mode),
        }
    }

    /// Schema-model validator.
    #[must_use]
    pub const fn strict() -> Self {
        Self::new(Mode::Strict)
    }

    /// Object-model validator.
    #[must_use]
    pub const fn permissive() -> Self {
        Self::new(Mode::Permissive)
    }

    /// Strictness mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.codec.mode()
    }

    /// Underlying codec.
    #[must_use]
    pub const fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Validate a document value.
    ///
    /// Fails on the first structural error.
    #[instrument(name = "validate_document", skip_all, fields(mode = %self.mode()))]
    pub fn validate(&self, value: &Value) -> Result<Document> {
        let document: Document = self.codec.decode(value)?;
        debug!(
            jobs = document.jobs.len(),
            workflows = document.workflows.len(),
            "document is well-formed"
        );
        Ok(document)
    }

    /// Validate the result of parsing an input.
    ///
    /// A parse failure becomes [`Outcome::MalformedInput`] with its message
    /// unchanged.
    pub fn validate_input<E: fmt::Display>(&self, input: std::result::Result<Value, E>) -> Outcome {
        match input {
            Err(err) => {
                let message = err.to_string();
                warn!(%message, "input is not a value tree");
                Outcome::MalformedInput(message)
            }
            Ok(value) => match self.validate(&value) {
                Ok(document) => Outcome::Valid(Box::new(document)),
                Err(err) => {
                    debug!(kind = ?err.kind(), path = %err.path(), "document rejected");
                    Outcome::Invalid(err)
                }
            },
        }
    }

    /// Validate a fragment against a single entity and return its canonical
    /// form.
    #[instrument(name = "validate_entity", skip_all, fields(entity = schema.name, mode = %self.mode()))]
    pub fn validate_entity(&self, schema: &'static EntitySchema, value: &Value) -> Result<Value> {
        self.codec.canonicalize(value, &Shape::Entity(schema))
    }

    /// Encode a document in declared key order.
    pub fn encode(&self, document: &Document) -> Result<Value> {
        self.codec.encode(document)
    }
}

/// Validate `value` with the object model.
pub fn validate(value: &Value) -> Result<Document> {
    Validator::permissive().validate(value)
}

/// Validate `value` with the schema model.
pub fn validate_strict(value: &Value) -> Result<Document> {
    Validator::strict().validate(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, ErrorKind, FieldPath};
    use crate::schema::Registry;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "version": 2.1,
            "jobs": {
                "build": {
                    "docker": [{"image": "cimg/base:stable"}],
                    "steps": ["checkout", {"run": "make"}],
                }
            },
            "workflows": {"main": {"jobs": ["build"]}},
        })
    }

    #[test]
    fn test_validate_minimal_document() {
        let document = validate(&minimal()).unwrap();
        assert!((document.version - 2.1).abs() < f64::EPSILON);
        assert!(!document.is_setup());
        assert_eq!(document.job("build").unwrap().steps.len(), 2);
    }

    #[test]
    fn test_missing_workflows() {
        let mut value = minimal();
        value.as_object_mut().unwrap().remove("workflows");
        let err = validate(&value).unwrap_err();
        assert_eq!(err, DecodeError::missing(&FieldPath::root(), "workflows"));
    }

    #[test]
    fn test_strict_requires_setup() {
        let err = validate_strict(&minimal()).unwrap_err();
        assert_eq!(err.field(), Some("setup"));
    }

    #[test]
    fn test_outcomes() {
        let validator = Validator::permissive();

        let outcome = validator.validate_input(Ok::<_, String>(minimal()));
        assert!(outcome.is_valid());
        assert!(outcome.document().is_some());

        let outcome = validator.validate_input(Ok::<_, String>(json!({"version": 2.1})));
        assert!(matches!(outcome, Outcome::Invalid(ref e) if e.kind() == ErrorKind::MissingRequiredField));

        let outcome = validator.validate_input(Err::<Value, _>("did not find expected key"));
        assert_eq!(
            outcome,
            Outcome::MalformedInput("did not find expected key".to_string())
        );
    }

    #[test]
    fn test_validate_entity() {
        let schema = Registry::global().get("DockerImage").unwrap();
        let canonical = Validator::strict()
            .validate_entity(schema, &json!({"user": "root", "image": "postgres:16"}))
            .unwrap();
        assert_eq!(
            canonical.as_object().unwrap().keys().collect::<Vec<_>>(),
            ["image", "user"]
        );
    }

    #[test]
    fn test_encode_document() {
        let validator = Validator::permissive();
        let document = validator.validate(&minimal()).unwrap();
        let encoded = validator.encode(&document).unwrap();
        assert_eq!(encoded["jobs"]["build"]["steps"][1], json!({"run": {"command": "make"}}));
        assert_eq!(validator.validate(&encoded).unwrap(), document);
    }
}
