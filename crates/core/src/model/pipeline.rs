//! Pipeline values: the `pipeline.*` context a configuration runs against.
//!
//! These are not part of a configuration document. A CI provider supplies
//! them at run time; on a local machine they are stubbed and marked with
//! `_isLocal`.

use super::ParameterType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `pipeline.*` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Globally unique pipeline id
    pub id: String,

    /// Set when the values were stubbed outside the CI provider
    #[serde(rename = "_isLocal", skip_serializing_if = "Option::is_none")]
    pub is_local: Option<bool>,

    /// Per-project pipeline number
    pub number: i64,

    /// User-defined parameters, in declaration order
    pub parameters: Vec<PipelineParameter>,
}

impl Pipeline {
    /// A pipeline with no parameters.
    #[must_use]
    pub fn new(id: impl Into<String>, number: i64) -> Self {
        Self {
            id: id.into(),
            is_local: None,
            number,
            parameters: Vec::new(),
        }
    }

    /// Parameter named `name`.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&PipelineParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// A pipeline parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineParameter {
    /// Declared default
    #[serde(rename = "defaultValue", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    /// Accepted values for enum parameters
    #[serde(rename = "enumValues", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    /// Parameter name
    pub name: String,

    /// Declared type
    #[serde(rename = "parameterType")]
    pub parameter_type: ParameterType,

    /// Value passed for this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PipelineParameter {
    /// The passed value, or the default when none was passed.
    #[must_use]
    pub fn effective_value(&self) -> Option<&Value> {
        self.value.as_ref().or(self.default_value.as_ref())
    }
}

/// `pipeline.git.*` values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Git {
    /// SHA of the previous build
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_revision: Option<String>,

    /// Branch that was pushed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Set when the values were stubbed outside the CI provider
    #[serde(rename = "_isLocal", skip_serializing_if = "Option::is_none")]
    pub is_local: Option<bool>,

    /// SHA being built
    pub revision: String,

    /// Tag that was pushed; empty when the trigger was not a tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Git {
    /// Whether a tag push triggered the pipeline.
    #[must_use]
    pub fn is_tag(&self) -> bool {
        self.tag.as_deref().is_some_and(|tag| !tag.is_empty())
    }
}

/// `pipeline.project.*` values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// URL the project is hosted at
    pub git_url: String,

    /// Set when the values were stubbed outside the CI provider
    #[serde(rename = "_isLocal", skip_serializing_if = "Option::is_none")]
    pub is_local: Option<bool>,

    /// Lower-case VCS provider name, such as `github`
    pub vcs: String,
}
