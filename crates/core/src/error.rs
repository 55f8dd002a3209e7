//! Decode and encode errors for configuration documents.
//!
//! Every error carries the [`FieldPath`] from the document root to the
//! offending value, so a diagnostic can point at `jobs.build.steps[1].run`
//! instead of just naming a type.

use miette::Diagnostic;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Result type for decode and encode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// One step in a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A map key.
    Key(String),
    /// A list index.
    Index(usize),
}

/// Location of a value inside a configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path, pointing at the document root.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Append a map key.
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.0.push(PathSegment::Key(key.into()));
    }

    /// Append a list index.
    pub fn push_index(&mut self, index: usize) {
        self.0.push(PathSegment::Index(index));
    }

    /// Remove the last segment.
    pub fn pop(&mut self) {
        self.0.pop();
    }

    /// A copy of this path with `key` appended.
    #[must_use]
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.push_key(key);
        path
    }

    /// Segments from the root outwards.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Whether this path points at the document root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The innermost map key, skipping trailing list indices.
    #[must_use]
    pub fn last_key(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|segment| match segment {
            PathSegment::Key(key) => Some(key.as_str()),
            PathSegment::Index(_) => None,
        })
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl From<&serde_path_to_error::Path> for FieldPath {
    fn from(path: &serde_path_to_error::Path) -> Self {
        use serde_path_to_error::Segment;

        let segments = path
            .iter()
            .filter_map(|segment| match segment {
                Segment::Seq { index } => Some(PathSegment::Index(*index)),
                Segment::Map { key } => Some(PathSegment::Key(key.clone())),
                Segment::Enum { variant } => Some(PathSegment::Key(variant.clone())),
                Segment::Unknown => None,
            })
            .collect::<Vec<_>>();
        Self(segments)
    }
}

/// Keys made of these characters print bare; anything else is quoted.
fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/' | '@'))
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if is_plain_key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Key(key) => write!(f, "[{key:?}]")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Runtime variant of a generic value, used in type-mismatch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool,
    /// Any number
    Number,
    /// A string
    String,
    /// An ordered list
    List,
    /// A key-value map
    Map,
}

impl ValueKind {
    /// Classify a value.
    #[must_use]
    pub const fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::List,
            Value::Object(_) => Self::Map,
        }
    }

    /// Lowercase name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::List => "list",
            Self::Map => "map",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag identifying the kind of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`DecodeError::TypeMismatch`]
    TypeMismatch,
    /// See [`DecodeError::MissingRequiredField`]
    MissingRequiredField,
    /// See [`DecodeError::UnknownField`]
    UnknownField,
    /// See [`DecodeError::UnsupportedValue`]
    UnsupportedValue,
    /// See [`DecodeError::UnknownExecutorShape`]
    UnknownExecutorShape,
    /// See [`DecodeError::AmbiguousStepShape`]
    AmbiguousStepShape,
    /// See [`DecodeError::AmbiguousWorkflowJob`]
    AmbiguousWorkflowJob,
    /// See [`DecodeError::Serde`]
    Serde,
}

fn describe_keys(keys: &[String]) -> String {
    if keys.is_empty() {
        "no marker key present".to_string()
    } else {
        let quoted = keys.iter().map(|k| format!("`{k}`")).collect::<Vec<_>>();
        format!("found keys {}", quoted.join(", "))
    }
}

/// Structural error found while decoding or encoding a document.
///
/// Decoding is fail-fast: the first error aborts and no partial document is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum DecodeError {
    /// A value's runtime shape disagrees with the declared field shape.
    #[error("type mismatch at {path}: expected {expected}, found {actual}")]
    #[diagnostic(
        code(ccvalidator::decode::type_mismatch),
        help("Check the value against the CircleCI configuration reference")
    )]
    TypeMismatch {
        /// Location of the value
        path: FieldPath,
        /// Declared shape
        expected: String,
        /// Shape actually found
        actual: ValueKind,
    },

    /// A required field is absent from the source map or the entity instance.
    #[error("missing required field `{field}` at {path}")]
    #[diagnostic(
        code(ccvalidator::decode::missing_field),
        help("Add the missing key; the configuration schema requires it")
    )]
    MissingRequiredField {
        /// Location of the map that lacks the field
        path: FieldPath,
        /// Wire name of the missing field
        field: String,
    },

    /// A closed entity received a key it does not declare.
    #[error("unknown field `{field}` at {path}")]
    #[diagnostic(
        code(ccvalidator::decode::unknown_field),
        help("Remove the key or check its spelling")
    )]
    UnknownField {
        /// Location of the map holding the key
        path: FieldPath,
        /// The unrecognized key
        field: String,
    },

    /// A string field only accepts a fixed set of values.
    #[error("unsupported value {value:?} at {path}; expected one of: {}", allowed.join(", "))]
    #[diagnostic(code(ccvalidator::decode::unsupported_value))]
    UnsupportedValue {
        /// Location of the value
        path: FieldPath,
        /// The value found
        value: String,
        /// Accepted values
        allowed: Vec<String>,
    },

    /// Executor resolution found zero or several executor marker keys.
    #[error("unknown executor shape at {path}: {}", describe_keys(keys))]
    #[diagnostic(
        code(ccvalidator::resolve::executor),
        help("Declare exactly one of `docker`, `machine`, `macos`, or reference a named `executor`")
    )]
    UnknownExecutorShape {
        /// Location of the map being resolved
        path: FieldPath,
        /// Marker keys that were present
        keys: Vec<String>,
    },

    /// A step map did not have exactly one top-level key.
    #[error("ambiguous step shape at {path}: {}", describe_keys(keys))]
    #[diagnostic(
        code(ccvalidator::resolve::step),
        help("Write each step as a single-key map such as `run: {{command: make}}`, or as a bare command name")
    )]
    AmbiguousStepShape {
        /// Location of the step
        path: FieldPath,
        /// Top-level keys of the step map
        keys: Vec<String>,
    },

    /// A workflow job entry did not have exactly one top-level key.
    #[error("ambiguous workflow job at {path}: {}", describe_keys(keys))]
    #[diagnostic(
        code(ccvalidator::resolve::workflow_job),
        help("Write each workflow job as a job name, or as `job-name: {{requires: [...]}}`")
    )]
    AmbiguousWorkflowJob {
        /// Location of the workflow job entry
        path: FieldPath,
        /// Top-level keys of the entry
        keys: Vec<String>,
    },

    /// The typed model rejected a value the structural walk accepted.
    #[error("cannot convert value at {path}: {message}")]
    #[diagnostic(code(ccvalidator::decode::serde))]
    Serde {
        /// Location reported by the deserializer
        path: FieldPath,
        /// Deserializer message
        message: String,
    },
}

impl DecodeError {
    /// Build a type mismatch for `value`.
    #[must_use]
    pub fn mismatch(path: &FieldPath, expected: impl Into<String>, value: &Value) -> Self {
        Self::TypeMismatch {
            path: path.clone(),
            expected: expected.into(),
            actual: ValueKind::of(value),
        }
    }

    /// Build a missing-field error for the map at `path`.
    #[must_use]
    pub fn missing(path: &FieldPath, field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            path: path.clone(),
            field: field.into(),
        }
    }

    /// Path from the document root to the offending value.
    #[must_use]
    pub const fn path(&self) -> &FieldPath {
        match self {
            Self::TypeMismatch { path, .. }
            | Self::MissingRequiredField { path, .. }
            | Self::UnknownField { path, .. }
            | Self::UnsupportedValue { path, .. }
            | Self::UnknownExecutorShape { path, .. }
            | Self::AmbiguousStepShape { path, .. }
            | Self::AmbiguousWorkflowJob { path, .. }
            | Self::Serde { path, .. } => path,
        }
    }

    /// Error-kind tag.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
            Self::UnknownField { .. } => ErrorKind::UnknownField,
            Self::UnsupportedValue { .. } => ErrorKind::UnsupportedValue,
            Self::UnknownExecutorShape { .. } => ErrorKind::UnknownExecutorShape,
            Self::AmbiguousStepShape { .. } => ErrorKind::AmbiguousStepShape,
            Self::AmbiguousWorkflowJob { .. } => ErrorKind::AmbiguousWorkflowJob,
            Self::Serde { .. } => ErrorKind::Serde,
        }
    }

    /// Wire name of the offending field.
    ///
    /// For missing and unknown fields this is the field itself; otherwise it
    /// is the innermost key of the path.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField { field, .. } | Self::UnknownField { field, .. } => {
                Some(field)
            }
            other => other.path().last_key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> FieldPath {
        let mut path = FieldPath::root();
        for segment in segments {
            match segment.parse::<usize>() {
                Ok(index) => path.push_index(index),
                Err(_) => path.push_key(*segment),
            }
        }
        path
    }

    #[test]
    fn test_path_display() {
        assert_eq!(FieldPath::root().to_string(), "<root>");
        assert_eq!(
            path(&["jobs", "build", "steps", "1", "run"]).to_string(),
            "jobs.build.steps[1].run"
        );
        assert_eq!(
            path(&["jobs", "build", "steps", "0", "node/install"]).to_string(),
            "jobs.build.steps[0].node/install"
        );
        assert_eq!(
            path(&["workflows", "a.b"]).to_string(),
            "workflows[\"a.b\"]"
        );
    }

    #[test]
    fn test_last_key_skips_indices() {
        let p = path(&["workflows", "ci", "jobs", "2"]);
        assert_eq!(p.last_key(), Some("jobs"));
        assert_eq!(FieldPath::root().last_key(), None);
    }

    #[test]
    fn test_value_kind_of() {
        assert_eq!(ValueKind::of(&json!(null)), ValueKind::Null);
        assert_eq!(ValueKind::of(&json!(1.5)), ValueKind::Number);
        assert_eq!(ValueKind::of(&json!([])), ValueKind::List);
        assert_eq!(ValueKind::of(&json!({})), ValueKind::Map);
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = DecodeError::mismatch(&path(&["version"]), "number", &json!("2.1"));
        assert_eq!(
            err.to_string(),
            "type mismatch at version: expected number, found string"
        );
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(err.field(), Some("version"));
    }

    #[test]
    fn test_missing_field_names_field() {
        let err = DecodeError::missing(&FieldPath::root(), "workflows");
        assert_eq!(err.field(), Some("workflows"));
        assert!(err.to_string().contains("`workflows`"));
        assert!(err.to_string().contains("<root>"));
    }

    #[test]
    fn test_marker_errors_describe_keys() {
        let err = DecodeError::AmbiguousStepShape {
            path: path(&["jobs", "build", "steps", "0"]),
            keys: vec!["run".to_string(), "checkout".to_string()],
        };
        assert!(err.to_string().contains("`run`, `checkout`"));

        let err = DecodeError::UnknownExecutorShape {
            path: path(&["jobs", "build"]),
            keys: vec![],
        };
        assert!(err.to_string().contains("no marker key present"));
    }

    #[test]
    fn test_diagnostic_codes() {
        use miette::Diagnostic;

        let err = DecodeError::missing(&FieldPath::root(), "jobs");
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("ccvalidator::decode::missing_field".to_string())
        );
        assert!(err.help().is_some());

        let err = DecodeError::AmbiguousWorkflowJob {
            path: FieldPath::root(),
            keys: vec![],
        };
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("ccvalidator::resolve::workflow_job".to_string())
        );
    }

    #[test]
    fn test_path_serializes_as_string() {
        let json = serde_json::to_value(path(&["jobs", "test"])).unwrap();
        assert_eq!(json, json!("jobs.test"));
    }
}
