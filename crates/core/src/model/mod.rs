//! Typed configuration model.
//!
//! Every struct here serializes to the configuration's wire form, so the
//! codec can encode a value by serializing it and walking the result.

mod document;
mod executor;
mod job;
mod pipeline;
mod step;
mod workflow;

pub use document::{Document, OrbImport, OrbImports};
pub use executor::{
    DockerAuth, DockerAwsAuth, DockerExecutor, DockerImage, Executor, ExecutorDefinition,
    ExecutorReference, MacOsExecutor, MacOsVersion, MachineExecutor, MachineImage,
    ReferencedExecutor, WindowsExecutor,
};
pub use job::{CommandDefinition, Job, ParameterDefinition, ParameterType};
pub use pipeline::{Git, Pipeline, PipelineParameter, Project};
pub use step::{
    AddSshKeysParameters, AttachWorkspaceParameters, CheckoutParameters, CustomStep,
    PersistToWorkspaceParameters, RestoreCacheParameters, RunParameters, SaveCacheParameters,
    SetupRemoteDockerParameters, Step, StepCondition, StoreArtifactsParameters,
    StoreTestResultsParameters,
};
pub use workflow::{
    FilterRule, Filters, Matrix, Workflow, WorkflowJob, WorkflowJobParameters, WorkflowJobType,
};

use crate::codec::Entity;
use crate::error::{DecodeError, FieldPath};
use crate::schema::{EntitySchema, entities};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Generic parameter bag, in source order.
pub type Parameters = indexmap::IndexMap<String, Value>;

/// Build a typed value, reporting failures under `path`.
pub(crate) fn from_json<T: DeserializeOwned>(
    value: Value,
    path: &FieldPath,
) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|err| DecodeError::Serde {
        path: path.clone(),
        message: err.to_string(),
    })
}

/// One string, or a list of strings.
///
/// Deserializes from either form; always serializes as a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl StringList {
    /// The strings, in order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether `value` is one of the strings.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|s| s == value)
    }
}

impl<'de> Deserialize<'de> for StringList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(String),
            Many(Vec<String>),
        }

        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(value) => Self(vec![value]),
            OneOrMany::Many(values) => Self(values),
        })
    }
}

impl From<Vec<String>> for StringList {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl From<&str> for StringList {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

macro_rules! impl_entity {
    ($($ty:ty => $schema:expr),+ $(,)?) => {
        $(
            impl Entity for $ty {
                fn schema() -> &'static EntitySchema {
                    &$schema
                }
            }
        )+
    };
}

impl_entity! {
    Document => entities::DOCUMENT,
    OrbImport => entities::ORB_IMPORT,
    ParameterDefinition => entities::PARAMETER_DEFINITION,
    CommandDefinition => entities::COMMAND_DEFINITION,
    ExecutorDefinition => entities::EXECUTOR_DEFINITION,
    Job => entities::JOB,
    DockerExecutor => entities::DOCKER_EXECUTOR,
    MachineExecutor => entities::MACHINE_EXECUTOR,
    WindowsExecutor => entities::WINDOWS_EXECUTOR,
    MacOsExecutor => entities::MACOS_EXECUTOR,
    ReferencedExecutor => entities::REFERENCED_EXECUTOR,
    DockerImage => entities::DOCKER_IMAGE,
    DockerAuth => entities::DOCKER_AUTH,
    DockerAwsAuth => entities::DOCKER_AWS_AUTH,
    MachineImage => entities::MACHINE_IMAGE,
    MacOsVersion => entities::MACOS_VERSION,
    RunParameters => entities::RUN_PARAMETERS,
    CheckoutParameters => entities::CHECKOUT_PARAMETERS,
    SaveCacheParameters => entities::SAVE_CACHE_PARAMETERS,
    RestoreCacheParameters => entities::RESTORE_CACHE_PARAMETERS,
    PersistToWorkspaceParameters => entities::PERSIST_TO_WORKSPACE_PARAMETERS,
    AttachWorkspaceParameters => entities::ATTACH_WORKSPACE_PARAMETERS,
    AddSshKeysParameters => entities::ADD_SSH_KEYS_PARAMETERS,
    StoreArtifactsParameters => entities::STORE_ARTIFACTS_PARAMETERS,
    StoreTestResultsParameters => entities::STORE_TEST_RESULTS_PARAMETERS,
    SetupRemoteDockerParameters => entities::SETUP_REMOTE_DOCKER_PARAMETERS,
    Workflow => entities::WORKFLOW,
    WorkflowJobParameters => entities::WORKFLOW_JOB_PARAMETERS,
    Filters => entities::FILTERS,
    FilterRule => entities::FILTER_RULE,
    Matrix => entities::MATRIX,
    Pipeline => entities::PIPELINE,
    PipelineParameter => entities::PIPELINE_PARAMETER,
    Git => entities::GIT,
    Project => entities::PROJECT,
}
