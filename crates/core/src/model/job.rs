//! Jobs, reusable commands and parameter declarations.

use super::{Executor, Step};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// Free text
    String,
    /// `true` / `false`
    Boolean,
    /// Whole number
    Integer,
    /// One of the declared `enum` values
    Enum,
    /// An executor
    Executor,
    /// A list of steps
    Steps,
    /// Name of an environment variable
    EnvVarName,
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Parameter type
    #[serde(rename = "type")]
    pub parameter_type: ParameterType,

    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Value used when the caller passes none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Accepted values for [`ParameterType::Enum`]
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

impl ParameterDefinition {
    /// Whether callers must pass a value.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// A reusable command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDefinition {
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, ParameterDefinition>>,

    /// Steps, in order
    pub steps: Vec<Step>,
}

/// A job.
///
/// Keys the job does not declare are kept in `additional_properties` and
/// re-emitted after the declared keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Runtime keys
    #[serde(flatten)]
    pub executor: Executor,

    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, ParameterDefinition>>,

    /// Environment variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<IndexMap<String, String>>,

    /// Working directory for steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    /// Number of parallel containers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,

    /// Steps, in order
    pub steps: Vec<Step>,

    /// Undeclared keys
    #[serde(flatten)]
    pub additional_properties: IndexMap<String, Value>,
}

impl Job {
    /// A job with `steps` on `executor` and nothing else set.
    #[must_use]
    pub fn new(executor: Executor, steps: Vec<Step>) -> Self {
        Self {
            executor,
            description: None,
            parameters: None,
            environment: None,
            working_directory: None,
            parallelism: None,
            steps,
            additional_properties: IndexMap::new(),
        }
    }
}
