//! Workflows and their job entries.

use super::{Parameters, StringList, from_json};
use crate::error::{DecodeError, FieldPath};
use crate::resolver;
use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A workflow: the jobs to run and their ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Job entries, in order
    pub jobs: Vec<WorkflowJob>,

    /// Scheduled triggers, kept verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggers: Option<Value>,

    /// Run condition, kept verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<Value>,

    /// Skip condition, kept verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unless: Option<Value>,
}

impl Workflow {
    /// A workflow running `jobs` with no conditions.
    #[must_use]
    pub fn new(jobs: Vec<WorkflowJob>) -> Self {
        Self {
            jobs,
            triggers: None,
            when: None,
            unless: None,
        }
    }
}

/// Workflow job `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowJobType {
    /// Wait for manual approval
    Approval,
}

/// One filter rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    /// Names or `/regex/` patterns to include
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only: Option<StringList>,

    /// Names or `/regex/` patterns to exclude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore: Option<StringList>,
}

/// Branch and tag filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// Branch filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<FilterRule>,

    /// Tag filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<FilterRule>,
}

/// Matrix expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    /// Values per parameter
    pub parameters: IndexMap<String, Vec<Value>>,

    /// Combinations to skip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<IndexMap<String, Value>>>,

    /// Name other jobs can require
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Options attached to a job in a workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowJobParameters {
    /// Display name, required when the same job runs twice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Jobs that must finish first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires: Option<Vec<String>>,

    /// Contexts providing environment variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<StringList>,

    /// Job type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub job_type: Option<WorkflowJobType>,

    /// Branch and tag filters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,

    /// Matrix expansion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Matrix>,

    /// Job parameter values
    #[serde(flatten)]
    pub additional_properties: Parameters,
}

/// A job entry in a workflow.
///
/// The wire form is the bare job name, or a single-key map from the job
/// name to its options.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowJob {
    /// Name of the job in the document's `jobs` section
    pub job: String,
    /// Options, if any were given
    pub parameters: Option<WorkflowJobParameters>,
}

impl WorkflowJob {
    /// An entry without options.
    #[must_use]
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            parameters: None,
        }
    }

    /// An entry requiring other jobs.
    #[must_use]
    pub fn requiring<I, S>(job: impl Into<String>, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            job: job.into(),
            parameters: Some(WorkflowJobParameters {
                requires: Some(requires.into_iter().map(Into::into).collect()),
                ..WorkflowJobParameters::default()
            }),
        }
    }

    /// Jobs that must finish first.
    #[must_use]
    pub fn requires(&self) -> &[String] {
        self.parameters
            .as_ref()
            .and_then(|p| p.requires.as_deref())
            .unwrap_or_default()
    }

    /// Name shown for this entry: its `name` option, else the job name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.parameters
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .unwrap_or(&self.job)
    }

    /// Whether this entry is a manual approval gate.
    #[must_use]
    pub fn is_approval(&self) -> bool {
        self.parameters
            .as_ref()
            .is_some_and(|p| p.job_type == Some(WorkflowJobType::Approval))
    }

    /// Build an entry from a generic value.
    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let path = FieldPath::root();
        let (job, body) = resolver::resolve_workflow_job(value, &path)?;
        let parameters = match body {
            Value::Null => None,
            body => Some(from_json(body.clone(), &path.child(job))?),
        };
        Ok(Self {
            job: job.to_string(),
            parameters,
        })
    }
}

impl Serialize for WorkflowJob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.parameters {
            None => serializer.serialize_str(&self.job),
            Some(parameters) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(&self.job, parameters)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for WorkflowJob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(de::Error::custom)
    }
}
