//! Job steps.

use super::{Parameters, from_json};
use crate::error::{DecodeError, FieldPath};
use crate::resolver::{self, StepKind, StepVariant};
use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// When a step runs relative to earlier failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCondition {
    /// Regardless of earlier failures
    Always,
    /// Only if every earlier step succeeded
    OnSuccess,
    /// Only if an earlier step failed
    OnFail,
}

/// `run` parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Shell command to run
    pub command: String,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Shell override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,

    /// Extra environment variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<IndexMap<String, String>>,

    /// Run without blocking later steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<bool>,

    /// Directory to run in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    /// Silence timeout, e.g. `10m`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_output_timeout: Option<String>,

    /// Run condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<StepCondition>,
}

impl RunParameters {
    /// Parameters running `command` with defaults for everything else.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// `checkout` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutParameters {
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Checkout directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl CheckoutParameters {
    /// Checkout directory, defaulting to the working directory.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(".")
    }
}

/// `save_cache` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveCacheParameters {
    /// Cache key template
    pub key: String,

    /// Paths to store
    pub paths: Vec<String>,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Run condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<StepCondition>,
}

/// `restore_cache` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreCacheParameters {
    /// Candidate cache keys, most specific first
    pub keys: Vec<String>,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `persist_to_workspace` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistToWorkspaceParameters {
    /// Workspace root directory
    pub root: String,

    /// Paths under `root`
    pub paths: Vec<String>,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `attach_workspace` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachWorkspaceParameters {
    /// Mount directory
    pub at: String,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `add_ssh_keys` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSshKeysParameters {
    /// Key fingerprints
    pub fingerprints: Vec<String>,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `store_artifacts` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreArtifactsParameters {
    /// Path to upload
    pub path: String,

    /// Artifact prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `store_test_results` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreTestResultsParameters {
    /// Directory of result files
    pub path: String,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `setup_remote_docker` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupRemoteDockerParameters {
    /// Docker engine version
    pub version: String,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Invocation of a command or orb command with parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomStep {
    /// Command name, e.g. `node/install`
    pub name: String,
    /// Parameter values, unchecked
    pub parameters: Parameters,
}

/// One step of a job or command.
///
/// The wire form is a single-key map whose key selects the variant, or a
/// bare command name.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// `run`
    Run(RunParameters),
    /// `checkout`
    Checkout(CheckoutParameters),
    /// `save_cache`
    SaveCache(SaveCacheParameters),
    /// `restore_cache`
    RestoreCache(RestoreCacheParameters),
    /// `persist_to_workspace`
    PersistToWorkspace(PersistToWorkspaceParameters),
    /// `attach_workspace`
    AttachWorkspace(AttachWorkspaceParameters),
    /// `add_ssh_keys`
    AddSshKeys(AddSshKeysParameters),
    /// `store_artifacts`
    StoreArtifacts(StoreArtifactsParameters),
    /// `store_test_results`
    StoreTestResults(StoreTestResultsParameters),
    /// `setup_remote_docker`
    SetupRemoteDocker(SetupRemoteDockerParameters),
    /// A command invoked with parameters
    Custom(CustomStep),
    /// A command invoked by name alone
    Reference(String),
}

impl Step {
    /// A `run` step.
    #[must_use]
    pub fn run(command: impl Into<String>) -> Self {
        Self::Run(RunParameters::new(command))
    }

    /// A `checkout` step with default parameters.
    #[must_use]
    pub fn checkout() -> Self {
        Self::Checkout(CheckoutParameters::default())
    }

    /// A command invoked by name.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference(name.into())
    }

    /// The built-in kind, if any.
    #[must_use]
    pub const fn kind(&self) -> Option<StepKind> {
        match self {
            Self::Run(_) => Some(StepKind::Run),
            Self::Checkout(_) => Some(StepKind::Checkout),
            Self::SaveCache(_) => Some(StepKind::SaveCache),
            Self::RestoreCache(_) => Some(StepKind::RestoreCache),
            Self::PersistToWorkspace(_) => Some(StepKind::PersistToWorkspace),
            Self::AttachWorkspace(_) => Some(StepKind::AttachWorkspace),
            Self::AddSshKeys(_) => Some(StepKind::AddSshKeys),
            Self::StoreArtifacts(_) => Some(StepKind::StoreArtifacts),
            Self::StoreTestResults(_) => Some(StepKind::StoreTestResults),
            Self::SetupRemoteDocker(_) => Some(StepKind::SetupRemoteDocker),
            Self::Custom(_) | Self::Reference(_) => None,
        }
    }

    /// The marker key or command name identifying this step.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Custom(custom) => &custom.name,
            Self::Reference(name) => name,
            builtin => builtin.kind().map_or("", StepKind::marker),
        }
    }

    /// Build a step from a generic value, resolving its variant.
    ///
    /// Parameters are converted as-is; use the codec for full checking.
    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let path = FieldPath::root();
        match resolver::resolve_step_variant(value, &path)? {
            StepVariant::Reference(name) => Ok(Self::Reference(name.to_string())),
            StepVariant::Custom { name, body } => Ok(Self::Custom(CustomStep {
                name: name.to_string(),
                parameters: from_json(body.clone(), &path.child(name))?,
            })),
            StepVariant::Builtin { kind, body } => Self::builtin(kind, body, &path.child(kind.marker())),
        }
    }

    fn builtin(kind: StepKind, body: &Value, path: &FieldPath) -> Result<Self, DecodeError> {
        let body = match body {
            Value::String(command) if kind == StepKind::Run => {
                return Ok(Self::run(command.as_str()));
            }
            Value::Null => Value::Object(Map::new()),
            other => other.clone(),
        };
        Ok(match kind {
            StepKind::Run => Self::Run(from_json(body, path)?),
            StepKind::Checkout => Self::Checkout(from_json(body, path)?),
            StepKind::SaveCache => Self::SaveCache(from_json(body, path)?),
            StepKind::RestoreCache => Self::RestoreCache(from_json(body, path)?),
            StepKind::PersistToWorkspace => Self::PersistToWorkspace(from_json(body, path)?),
            StepKind::AttachWorkspace => Self::AttachWorkspace(from_json(body, path)?),
            StepKind::AddSshKeys => Self::AddSshKeys(from_json(body, path)?),
            StepKind::StoreArtifacts => Self::StoreArtifacts(from_json(body, path)?),
            StepKind::StoreTestResults => Self::StoreTestResults(from_json(body, path)?),
            StepKind::SetupRemoteDocker => Self::SetupRemoteDocker(from_json(body, path)?),
        })
    }
}

fn single_entry<S, V>(serializer: S, key: &str, value: &V) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize + ?Sized,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(key, value)?;
    map.end()
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let key = self.key();
        match self {
            Self::Run(params) => single_entry(serializer, key, params),
            Self::Checkout(params) => single_entry(serializer, key, params),
            Self::SaveCache(params) => single_entry(serializer, key, params),
            Self::RestoreCache(params) => single_entry(serializer, key, params),
            Self::PersistToWorkspace(params) => single_entry(serializer, key, params),
            Self::AttachWorkspace(params) => single_entry(serializer, key, params),
            Self::AddSshKeys(params) => single_entry(serializer, key, params),
            Self::StoreArtifacts(params) => single_entry(serializer, key, params),
            Self::StoreTestResults(params) => single_entry(serializer, key, params),
            Self::SetupRemoteDocker(params) => single_entry(serializer, key, params),
            Self::Custom(custom) => single_entry(serializer, key, &custom.parameters),
            Self::Reference(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_run_step() {
        let step: Step = serde_json::from_value(json!({"run": {"command": "echo hi"}})).unwrap();
        assert_eq!(step, Step::run("echo hi"));
        assert_eq!(step.kind(), Some(StepKind::Run));
    }

    #[test]
    fn test_run_shorthand() {
        let step: Step = serde_json::from_value(json!({"run": "make test"})).unwrap();
        assert_eq!(step, Step::run("make test"));
        assert_eq!(
            serde_json::to_value(&step).unwrap(),
            json!({"run": {"command": "make test"}})
        );
    }

    #[test]
    fn test_checkout_defaults() {
        let step: Step = serde_json::from_value(json!({"checkout": {}})).unwrap();
        match &step {
            Step::Checkout(params) => assert_eq!(params.path(), "."),
            other => panic!("expected checkout, got {other:?}"),
        }

        let step: Step = serde_json::from_value(json!({"checkout": null})).unwrap();
        assert_eq!(step, Step::checkout());
        assert_eq!(serde_json::to_value(&step).unwrap(), json!({"checkout": {}}));
    }

    #[test]
    fn test_reference_steps() {
        let step: Step = serde_json::from_value(json!("some_named_command")).unwrap();
        assert_eq!(step, Step::reference("some_named_command"));
        assert_eq!(serde_json::to_value(&step).unwrap(), json!("some_named_command"));

        let step: Step = serde_json::from_value(json!({"deploy": null})).unwrap();
        assert_eq!(step, Step::reference("deploy"));
    }

    #[test]
    fn test_custom_step_keeps_parameters() {
        let value = json!({"node/install": {"node-version": "20", "install-yarn": true}});
        let step: Step = serde_json::from_value(value.clone()).unwrap();
        match &step {
            Step::Custom(custom) => {
                assert_eq!(custom.name, "node/install");
                assert_eq!(custom.parameters["install-yarn"], json!(true));
            }
            other => panic!("expected custom step, got {other:?}"),
        }
        assert_eq!(serde_json::to_value(&step).unwrap(), value);
    }

    #[test]
    fn test_ambiguous_step_rejected() {
        let err = Step::from_value(&json!({"run": "x", "checkout": {}})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousStepShape);
    }

    #[test]
    fn test_save_cache_round_trip() {
        let step = Step::SaveCache(SaveCacheParameters {
            key: "deps-{{ checksum \"Cargo.lock\" }}".to_string(),
            paths: vec!["~/.cargo".to_string()],
            name: None,
            when: Some(StepCondition::Always),
        });
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["save_cache"]["when"], "always");
        assert_eq!(Step::from_value(&value).unwrap(), step);
    }
}
