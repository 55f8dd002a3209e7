//! Marker-key resolution of polymorphic values.
//!
//! Steps, executors and workflow job entries have no explicit type tag. Their
//! variant is decided by which keys are present, and these functions make
//! that decision before any field is decoded.

use crate::error::{DecodeError, FieldPath, Result};
use crate::schema::EntitySchema;
use crate::schema::entities;
use serde_json::{Map, Value};
use std::fmt;

static NULL: Value = Value::Null;

/// Every key that belongs to a job's executor rather than the job itself.
pub const EXECUTOR_KEYS: &[&str] = &[
    "executor",
    "docker",
    "machine",
    "macos",
    "shell",
    "resource_class",
];

/// Built-in step kinds, one per marker key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// `run`
    Run,
    /// `checkout`
    Checkout,
    /// `save_cache`
    SaveCache,
    /// `restore_cache`
    RestoreCache,
    /// `persist_to_workspace`
    PersistToWorkspace,
    /// `attach_workspace`
    AttachWorkspace,
    /// `add_ssh_keys`
    AddSshKeys,
    /// `store_artifacts`
    StoreArtifacts,
    /// `store_test_results`
    StoreTestResults,
    /// `setup_remote_docker`
    SetupRemoteDocker,
}

impl StepKind {
    /// All built-in step kinds.
    pub const ALL: [Self; 10] = [
        Self::Run,
        Self::Checkout,
        Self::SaveCache,
        Self::RestoreCache,
        Self::PersistToWorkspace,
        Self::AttachWorkspace,
        Self::AddSshKeys,
        Self::StoreArtifacts,
        Self::StoreTestResults,
        Self::SetupRemoteDocker,
    ];

    /// Wire key selecting this kind.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Checkout => "checkout",
            Self::SaveCache => "save_cache",
            Self::RestoreCache => "restore_cache",
            Self::PersistToWorkspace => "persist_to_workspace",
            Self::AttachWorkspace => "attach_workspace",
            Self::AddSshKeys => "add_ssh_keys",
            Self::StoreArtifacts => "store_artifacts",
            Self::StoreTestResults => "store_test_results",
            Self::SetupRemoteDocker => "setup_remote_docker",
        }
    }

    /// Kind selected by `key`, if it is a built-in marker.
    #[must_use]
    pub fn from_marker(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.marker() == key)
    }

    /// Schema of this kind's parameters.
    #[must_use]
    pub fn schema(self) -> &'static EntitySchema {
        match self {
            Self::Run => &entities::RUN_PARAMETERS,
            Self::Checkout => &entities::CHECKOUT_PARAMETERS,
            Self::SaveCache => &entities::SAVE_CACHE_PARAMETERS,
            Self::RestoreCache => &entities::RESTORE_CACHE_PARAMETERS,
            Self::PersistToWorkspace => &entities::PERSIST_TO_WORKSPACE_PARAMETERS,
            Self::AttachWorkspace => &entities::ATTACH_WORKSPACE_PARAMETERS,
            Self::AddSshKeys => &entities::ADD_SSH_KEYS_PARAMETERS,
            Self::StoreArtifacts => &entities::STORE_ARTIFACTS_PARAMETERS,
            Self::StoreTestResults => &entities::STORE_TEST_RESULTS_PARAMETERS,
            Self::SetupRemoteDocker => &entities::SETUP_REMOTE_DOCKER_PARAMETERS,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Resolved variant of a step, borrowing from the source value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepVariant<'a> {
    /// A built-in step with its (possibly null) body.
    Builtin {
        /// Which built-in
        kind: StepKind,
        /// Value under the marker key
        body: &'a Value,
    },
    /// A command or orb invocation with a parameter map.
    Custom {
        /// Command name
        name: &'a str,
        /// Parameter map
        body: &'a Value,
    },
    /// A command invoked by name alone.
    Reference(&'a str),
}

/// Decide the variant of a step.
///
/// A bare string is always a reference, even when it spells a built-in
/// marker. A map must have exactly one key.
pub fn resolve_step_variant<'a>(value: &'a Value, path: &FieldPath) -> Result<StepVariant<'a>> {
    match value {
        Value::String(name) => Ok(StepVariant::Reference(name)),
        Value::Object(map) => {
            let mut entries = map.iter();
            let (Some((key, body)), None) = (entries.next(), entries.next()) else {
                return Err(DecodeError::AmbiguousStepShape {
                    path: path.clone(),
                    keys: map.keys().cloned().collect(),
                });
            };
            if let Some(kind) = StepKind::from_marker(key) {
                return Ok(StepVariant::Builtin { kind, body });
            }
            match body {
                Value::Null => Ok(StepVariant::Reference(key)),
                Value::Object(_) => Ok(StepVariant::Custom { name: key, body }),
                other => Err(DecodeError::mismatch(
                    &path.child(key.as_str()),
                    "map of command parameters",
                    other,
                )),
            }
        }
        other => Err(DecodeError::mismatch(
            path,
            "step (command name or single-key map)",
            other,
        )),
    }
}

/// Executor variants, chosen by marker key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutorVariant {
    /// `docker`
    Docker,
    /// `machine`
    Machine,
    /// `machine` with `shell`
    Windows,
    /// `macos`
    MacOs,
    /// `executor`
    Reference,
}

impl ExecutorVariant {
    /// Schema of the keys this variant owns.
    #[must_use]
    pub fn schema(self) -> &'static EntitySchema {
        match self {
            Self::Docker => &entities::DOCKER_EXECUTOR,
            Self::Machine => &entities::MACHINE_EXECUTOR,
            Self::Windows => &entities::WINDOWS_EXECUTOR,
            Self::MacOs => &entities::MACOS_EXECUTOR,
            Self::Reference => &entities::REFERENCED_EXECUTOR,
        }
    }
}

impl fmt::Display for ExecutorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Docker => "docker",
            Self::Machine => "machine",
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Reference => "executor",
        };
        f.write_str(name)
    }
}

/// Decide the executor variant of a job or executor definition.
///
/// Exactly one of `docker`, `machine`, `macos` (or `executor`, when
/// `allow_reference` is set) must be present. `machine` alongside `shell`
/// selects [`ExecutorVariant::Windows`].
pub fn resolve_executor_variant(
    map: &Map<String, Value>,
    allow_reference: bool,
    path: &FieldPath,
) -> Result<ExecutorVariant> {
    let markers: &[&str] = if allow_reference {
        &["docker", "machine", "macos", "executor"]
    } else {
        &["docker", "machine", "macos"]
    };
    let present: Vec<&str> = markers
        .iter()
        .copied()
        .filter(|marker| map.contains_key(*marker))
        .collect();

    match present.as_slice() {
        ["docker"] => Ok(ExecutorVariant::Docker),
        ["machine"] if map.contains_key("shell") => Ok(ExecutorVariant::Windows),
        ["machine"] => Ok(ExecutorVariant::Machine),
        ["macos"] => Ok(ExecutorVariant::MacOs),
        ["executor"] => Ok(ExecutorVariant::Reference),
        _ => Err(DecodeError::UnknownExecutorShape {
            path: path.clone(),
            keys: present.into_iter().map(str::to_string).collect(),
        }),
    }
}

/// Split a workflow job entry into its job name and body.
///
/// A bare string has a null body.
pub fn resolve_workflow_job<'a>(value: &'a Value, path: &FieldPath) -> Result<(&'a str, &'a Value)> {
    match value {
        Value::String(name) => Ok((name, &NULL)),
        Value::Object(map) if map.len() == 1 => map
            .iter()
            .next()
            .map(|(name, body)| (name.as_str(), body))
            .ok_or_else(|| DecodeError::AmbiguousWorkflowJob {
                path: path.clone(),
                keys: Vec::new(),
            }),
        Value::Object(map) => Err(DecodeError::AmbiguousWorkflowJob {
            path: path.clone(),
            keys: map.keys().cloned().collect(),
        }),
        other => Err(DecodeError::mismatch(
            path,
            "workflow job (job name or single-key map)",
            other,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn step(value: &Value) -> Result<StepVariant<'_>> {
        resolve_step_variant(value, &FieldPath::root())
    }

    fn executor(value: &Value, allow_reference: bool) -> Result<ExecutorVariant> {
        let map = value.as_object().unwrap();
        resolve_executor_variant(map, allow_reference, &FieldPath::root())
    }

    #[test]
    fn test_builtin_markers() {
        let value = json!({"run": {"command": "echo hi"}});
        match step(&value).unwrap() {
            StepVariant::Builtin { kind, body } => {
                assert_eq!(kind, StepKind::Run);
                assert_eq!(body["command"], "echo hi");
            }
            other => panic!("expected run, got {other:?}"),
        }

        for kind in StepKind::ALL {
            let value = json!({ kind.marker(): {} });
            assert!(matches!(
                step(&value).unwrap(),
                StepVariant::Builtin { kind: k, .. } if k == kind
            ));
        }
    }

    #[test]
    fn test_bare_string_is_reference() {
        let value = json!("some_named_command");
        assert_eq!(step(&value).unwrap(), StepVariant::Reference("some_named_command"));

        // a bare marker name is still a reference
        let value = json!("checkout");
        assert_eq!(step(&value).unwrap(), StepVariant::Reference("checkout"));
    }

    #[test]
    fn test_null_body() {
        let value = json!({"checkout": null});
        assert!(matches!(
            step(&value).unwrap(),
            StepVariant::Builtin { kind: StepKind::Checkout, body } if body.is_null()
        ));

        let value = json!({"deploy": null});
        assert_eq!(step(&value).unwrap(), StepVariant::Reference("deploy"));
    }

    #[test]
    fn test_custom_command() {
        let value = json!({"node/install": {"node-version": "20"}});
        match step(&value).unwrap() {
            StepVariant::Custom { name, body } => {
                assert_eq!(name, "node/install");
                assert_eq!(body["node-version"], "20");
            }
            other => panic!("expected custom step, got {other:?}"),
        }

        let value = json!({"deploy": 3});
        let err = step(&value).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(err.path().to_string(), "deploy");
    }

    #[test]
    fn test_ambiguous_steps() {
        let value = json!({"run": {"command": "x"}, "checkout": {}});
        let err = step(&value).unwrap_err();
        assert_eq!(
            err,
            DecodeError::AmbiguousStepShape {
                path: FieldPath::root(),
                keys: vec!["run".to_string(), "checkout".to_string()],
            }
        );

        let value = json!({});
        assert_eq!(step(&value).unwrap_err().kind(), ErrorKind::AmbiguousStepShape);
    }

    #[test]
    fn test_non_map_step() {
        let value = json!(42);
        assert_eq!(step(&value).unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_executor_variants() {
        let docker = json!({"docker": [{"image": "cimg/base:stable"}]});
        assert_eq!(executor(&docker, true).unwrap(), ExecutorVariant::Docker);

        let machine = json!({"machine": {"image": "ubuntu-2204:current"}});
        assert_eq!(executor(&machine, true).unwrap(), ExecutorVariant::Machine);

        let windows = json!({"machine": {"image": "windows-server-2022-gui:current"}, "shell": "powershell.exe"});
        assert_eq!(executor(&windows, true).unwrap(), ExecutorVariant::Windows);

        let macos = json!({"macos": {"xcode": "15.4.0"}});
        assert_eq!(executor(&macos, true).unwrap(), ExecutorVariant::MacOs);

        let reference = json!({"executor": "node"});
        assert_eq!(executor(&reference, true).unwrap(), ExecutorVariant::Reference);
    }

    #[test]
    fn test_executor_shape_errors() {
        let none = json!({"steps": []});
        let err = executor(&none, true).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownExecutorShape {
                path: FieldPath::root(),
                keys: vec![],
            }
        );

        let both = json!({"docker": [], "machine": {}});
        match executor(&both, true).unwrap_err() {
            DecodeError::UnknownExecutorShape { keys, .. } => {
                assert_eq!(keys, ["docker", "machine"]);
            }
            other => panic!("unexpected error {other:?}"),
        }

        // references are only markers where they are allowed
        let reference = json!({"executor": "node"});
        assert_eq!(
            executor(&reference, false).unwrap_err().kind(),
            ErrorKind::UnknownExecutorShape
        );
    }

    #[test]
    fn test_workflow_job_entries() {
        let path = FieldPath::root();
        let bare = json!("build");
        let (name, body) = resolve_workflow_job(&bare, &path).unwrap();
        assert_eq!(name, "build");
        assert!(body.is_null());

        let value = json!({"test": {"requires": ["build"]}});
        let (name, body) = resolve_workflow_job(&value, &path).unwrap();
        assert_eq!(name, "test");
        assert_eq!(body["requires"][0], "build");

        let value = json!({"a": {}, "b": {}});
        assert_eq!(
            resolve_workflow_job(&value, &path).unwrap_err().kind(),
            ErrorKind::AmbiguousWorkflowJob
        );
        assert_eq!(
            resolve_workflow_job(&json!({}), &path).unwrap_err().kind(),
            ErrorKind::AmbiguousWorkflowJob
        );
        assert_eq!(
            resolve_workflow_job(&json!([1]), &path).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
    }
}
