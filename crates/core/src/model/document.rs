//! Root configuration document.

use super::{CommandDefinition, ExecutorDefinition, Job, ParameterDefinition, Workflow};
use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An orb imported under a local alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbImport {
    /// Local alias, e.g. `node`
    #[serde(rename = "orbAlias")]
    pub alias: String,

    /// Import reference, e.g. `circleci/node@5.2`
    #[serde(rename = "orbImport")]
    pub import: String,
}

/// Orb imports, in declaration order.
///
/// Reads both the list form and the `alias: import` map form; writes the
/// list form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OrbImports(pub Vec<OrbImport>);

impl OrbImports {
    /// Import reference for `alias`.
    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|orb| orb.alias == alias)
            .map(|orb| orb.import.as_str())
    }

    /// Imports, in order.
    pub fn iter(&self) -> impl Iterator<Item = &OrbImport> {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for OrbImports {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).map_err(de::Error::custom))
                .collect::<Result<Vec<_>, _>>()
                .map(Self),
            Value::Object(aliases) => aliases
                .into_iter()
                .map(|(alias, import)| match import {
                    Value::String(import) => Ok(OrbImport { alias, import }),
                    _ => Err(de::Error::custom(format!(
                        "orb `{alias}` must be an import string"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self),
            _ => Err(de::Error::custom("expected a list or map of orb imports")),
        }
    }
}

/// A validated configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Format version, e.g. `2.1`
    pub version: f64,

    /// Whether this is a setup configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup: Option<bool>,

    /// Imported orbs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orbs: Option<OrbImports>,

    /// Pipeline parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, ParameterDefinition>>,

    /// Reusable executors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executors: Option<IndexMap<String, ExecutorDefinition>>,

    /// Reusable commands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commands: Option<IndexMap<String, CommandDefinition>>,

    /// Jobs by name
    pub jobs: IndexMap<String, Job>,

    /// Workflows by name
    pub workflows: IndexMap<String, Workflow>,
}

impl Document {
    /// An empty document of `version`.
    #[must_use]
    pub fn new(version: f64) -> Self {
        Self {
            version,
            setup: None,
            orbs: None,
            parameters: None,
            executors: None,
            commands: None,
            jobs: IndexMap::new(),
            workflows: IndexMap::new(),
        }
    }

    /// Whether this is a setup configuration. Absent means `false`.
    #[must_use]
    pub fn is_setup(&self) -> bool {
        self.setup.unwrap_or(false)
    }

    /// Look up a job by name.
    #[must_use]
    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.get(name)
    }

    /// Look up a workflow by name.
    #[must_use]
    pub fn workflow(&self, name: &str) -> Option<&Workflow> {
        self.workflows.get(name)
    }

    /// Look up a command by name.
    #[must_use]
    pub fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.as_ref().and_then(|commands| commands.get(name))
    }

    /// Look up a reusable executor by name.
    #[must_use]
    pub fn executor(&self, name: &str) -> Option<&ExecutorDefinition> {
        self.executors
            .as_ref()
            .and_then(|executors| executors.get(name))
    }

    /// Import reference of the orb imported as `alias`.
    #[must_use]
    pub fn orb(&self, alias: &str) -> Option<&str> {
        self.orbs.as_ref().and_then(|orbs| orbs.get(alias))
    }
}
