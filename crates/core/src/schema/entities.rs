//! Metadata for every configuration entity.
//!
//! Field order here is wire order: encoding emits keys in this order.

use super::{EntitySchema, ExecutorSlot, FieldSpec, Openness, Shape};

/// Accepted `when` values on `run` and `save_cache` steps.
pub const STEP_CONDITIONS: &[&str] = &["always", "on_success", "on_fail"];

/// Accepted parameter `type` values.
pub const PARAMETER_TYPES: &[&str] = &[
    "string",
    "boolean",
    "integer",
    "enum",
    "executor",
    "steps",
    "env_var_name",
];

/// Accepted workflow job `type` values.
pub const WORKFLOW_JOB_TYPES: &[&str] = &["approval"];

// Entity shapes referenced from other entities.
static PARAMETER_DEFINITION_SHAPE: Shape = Shape::Entity(&PARAMETER_DEFINITION);
static EXECUTOR_DEFINITION_SHAPE: Shape = Shape::Entity(&EXECUTOR_DEFINITION);
static COMMAND_DEFINITION_SHAPE: Shape = Shape::Entity(&COMMAND_DEFINITION);
static JOB_SHAPE: Shape = Shape::Entity(&JOB);
static WORKFLOW_SHAPE: Shape = Shape::Entity(&WORKFLOW);
static DOCKER_IMAGE_SHAPE: Shape = Shape::Entity(&DOCKER_IMAGE);
static PIPELINE_PARAMETER_SHAPE: Shape = Shape::Entity(&PIPELINE_PARAMETER);

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Root of a configuration document.
pub static DOCUMENT: EntitySchema = EntitySchema {
    name: "Document",
    description: "Root of a configuration document",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("version", Shape::Number),
        FieldSpec::strict("setup", Shape::Bool),
        FieldSpec::optional("orbs", Shape::OrbImports),
        FieldSpec::optional("parameters", Shape::MapOf(&PARAMETER_DEFINITION_SHAPE)),
        FieldSpec::optional("executors", Shape::MapOf(&EXECUTOR_DEFINITION_SHAPE)),
        FieldSpec::optional("commands", Shape::MapOf(&COMMAND_DEFINITION_SHAPE)),
        FieldSpec::required("jobs", Shape::MapOf(&JOB_SHAPE)),
        FieldSpec::required("workflows", Shape::MapOf(&WORKFLOW_SHAPE)),
    ],
};

/// One imported orb.
pub static ORB_IMPORT: EntitySchema = EntitySchema {
    name: "OrbImport",
    description: "An orb imported under a local alias",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("orbAlias", Shape::String),
        FieldSpec::required("orbImport", Shape::String),
    ],
};

/// Parameter declaration on a pipeline, command, executor or job.
pub static PARAMETER_DEFINITION: EntitySchema = EntitySchema {
    name: "ParameterDefinition",
    description: "A declared parameter with its type and default",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("type", Shape::Choice(PARAMETER_TYPES)),
        FieldSpec::optional("description", Shape::String),
        FieldSpec::optional("default", Shape::Any),
        FieldSpec::optional("enum", Shape::ListOf(&Shape::String)),
    ],
};

/// Reusable command.
pub static COMMAND_DEFINITION: EntitySchema = EntitySchema {
    name: "CommandDefinition",
    description: "A reusable sequence of steps",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::optional("description", Shape::String),
        FieldSpec::optional("parameters", Shape::MapOf(&PARAMETER_DEFINITION_SHAPE)),
        FieldSpec::required("steps", Shape::ListOf(&Shape::Step)),
    ],
};

/// Reusable executor.
pub static EXECUTOR_DEFINITION: EntitySchema = EntitySchema {
    name: "ExecutorDefinition",
    description: "A named, reusable runtime environment",
    openness: Openness::Closed,
    executor: Some(ExecutorSlot {
        allow_reference: false,
    }),
    fields: &[
        FieldSpec::optional("description", Shape::String),
        FieldSpec::optional("parameters", Shape::MapOf(&PARAMETER_DEFINITION_SHAPE)),
        FieldSpec::optional("environment", Shape::MapOf(&Shape::String)),
        FieldSpec::optional("working_directory", Shape::String),
    ],
};

/// A job. Keys it does not declare are kept as additional properties.
pub static JOB: EntitySchema = EntitySchema {
    name: "Job",
    description: "A unit of work running steps inside an executor",
    openness: Openness::Open,
    executor: Some(ExecutorSlot {
        allow_reference: true,
    }),
    fields: &[
        FieldSpec::optional("description", Shape::String),
        FieldSpec::optional("parameters", Shape::MapOf(&PARAMETER_DEFINITION_SHAPE)),
        FieldSpec::optional("environment", Shape::MapOf(&Shape::String)),
        FieldSpec::optional("working_directory", Shape::String),
        FieldSpec::optional("parallelism", Shape::Count),
        FieldSpec::required("steps", Shape::ListOf(&Shape::Step)),
    ],
};

// ---------------------------------------------------------------------------
// Executors
// ---------------------------------------------------------------------------

/// Docker executor keys.
pub static DOCKER_EXECUTOR: EntitySchema = EntitySchema {
    name: "DockerExecutor",
    description: "Steps run in the first of a list of containers",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("docker", Shape::ListOf(&DOCKER_IMAGE_SHAPE)),
        FieldSpec::strict("resource_class", Shape::String),
        FieldSpec::optional("shell", Shape::String),
    ],
};

/// Linux virtual machine executor keys.
pub static MACHINE_EXECUTOR: EntitySchema = EntitySchema {
    name: "MachineExecutor",
    description: "Steps run in a dedicated Linux virtual machine",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("machine", Shape::Entity(&MACHINE_IMAGE)),
        FieldSpec::strict("resource_class", Shape::String),
    ],
};

/// Windows executor keys: a machine with an explicit shell.
pub static WINDOWS_EXECUTOR: EntitySchema = EntitySchema {
    name: "WindowsExecutor",
    description: "Steps run in a Windows virtual machine",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("machine", Shape::Entity(&MACHINE_IMAGE)),
        FieldSpec::required("shell", Shape::String),
        FieldSpec::strict("resource_class", Shape::String),
    ],
};

/// macOS executor keys.
pub static MACOS_EXECUTOR: EntitySchema = EntitySchema {
    name: "MacOsExecutor",
    description: "Steps run in a macOS virtual machine",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("macos", Shape::Entity(&MACOS_VERSION)),
        FieldSpec::strict("resource_class", Shape::String),
        FieldSpec::optional("shell", Shape::String),
    ],
};

/// Keys of a job that names a reusable executor.
pub static REFERENCED_EXECUTOR: EntitySchema = EntitySchema {
    name: "ReferencedExecutor",
    description: "A job executor taken from the `executors` section",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("executor", Shape::NameOrEntity(&EXECUTOR_REFERENCE)),
        FieldSpec::optional("resource_class", Shape::String),
        FieldSpec::optional("shell", Shape::String),
    ],
};

/// Map form of an executor reference; extra keys are executor parameters.
pub static EXECUTOR_REFERENCE: EntitySchema = EntitySchema {
    name: "ExecutorReference",
    description: "A named executor with parameter values",
    openness: Openness::Open,
    executor: None,
    fields: &[FieldSpec::required("name", Shape::String)],
};

/// Container image in a docker executor.
pub static DOCKER_IMAGE: EntitySchema = EntitySchema {
    name: "DockerImage",
    description: "A container image; the first one runs the steps",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("image", Shape::String),
        FieldSpec::optional("name", Shape::String),
        FieldSpec::optional("entrypoint", Shape::StringList),
        FieldSpec::optional("command", Shape::StringList),
        FieldSpec::optional("user", Shape::String),
        FieldSpec::optional("environment", Shape::MapOf(&Shape::String)),
        FieldSpec::optional("auth", Shape::Entity(&DOCKER_AUTH)),
        FieldSpec::optional("aws_auth", Shape::Entity(&DOCKER_AWS_AUTH)),
    ],
};

/// Registry credentials.
pub static DOCKER_AUTH: EntitySchema = EntitySchema {
    name: "DockerAuth",
    description: "Username and password for a private registry",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("username", Shape::String),
        FieldSpec::required("password", Shape::String),
    ],
};

/// AWS ECR credentials.
pub static DOCKER_AWS_AUTH: EntitySchema = EntitySchema {
    name: "DockerAwsAuth",
    description: "AWS credentials for an ECR registry",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("aws_access_key_id", Shape::String),
        FieldSpec::required("aws_secret_access_key", Shape::String),
    ],
};

/// Virtual machine image.
pub static MACHINE_IMAGE: EntitySchema = EntitySchema {
    name: "MachineImage",
    description: "A virtual machine image",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("image", Shape::String),
        FieldSpec::optional("docker_layer_caching", Shape::Bool),
    ],
};

/// macOS Xcode selection.
pub static MACOS_VERSION: EntitySchema = EntitySchema {
    name: "MacOsVersion",
    description: "The Xcode version of a macOS executor",
    openness: Openness::Closed,
    executor: None,
    fields: &[FieldSpec::required("xcode", Shape::String)],
};

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// `run` step.
pub static RUN_PARAMETERS: EntitySchema = EntitySchema {
    name: "RunParameters",
    description: "Invoke a shell command",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("command", Shape::String),
        FieldSpec::optional("name", Shape::String),
        FieldSpec::optional("shell", Shape::String),
        FieldSpec::optional("environment", Shape::MapOf(&Shape::String)),
        FieldSpec::optional("background", Shape::Bool),
        FieldSpec::optional("working_directory", Shape::String),
        FieldSpec::optional("no_output_timeout", Shape::String),
        FieldSpec::optional("when", Shape::Choice(STEP_CONDITIONS)),
    ],
};

/// `checkout` step.
pub static CHECKOUT_PARAMETERS: EntitySchema = EntitySchema {
    name: "CheckoutParameters",
    description: "Check out the project source",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::optional("name", Shape::String),
        FieldSpec::optional("path", Shape::String),
    ],
};

/// `save_cache` step.
pub static SAVE_CACHE_PARAMETERS: EntitySchema = EntitySchema {
    name: "SaveCacheParameters",
    description: "Store paths in the dependency cache",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("key", Shape::String),
        FieldSpec::required("paths", Shape::ListOf(&Shape::String)),
        FieldSpec::optional("name", Shape::String),
        FieldSpec::optional("when", Shape::Choice(STEP_CONDITIONS)),
    ],
};

/// `restore_cache` step.
pub static RESTORE_CACHE_PARAMETERS: EntitySchema = EntitySchema {
    name: "RestoreCacheParameters",
    description: "Restore the first matching dependency cache",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("keys", Shape::ListOf(&Shape::String)),
        FieldSpec::optional("name", Shape::String),
    ],
};

/// `persist_to_workspace` step.
pub static PERSIST_TO_WORKSPACE_PARAMETERS: EntitySchema = EntitySchema {
    name: "PersistToWorkspaceParameters",
    description: "Share files with downstream jobs",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("root", Shape::String),
        FieldSpec::required("paths", Shape::ListOf(&Shape::String)),
        FieldSpec::optional("name", Shape::String),
    ],
};

/// `attach_workspace` step.
pub static ATTACH_WORKSPACE_PARAMETERS: EntitySchema = EntitySchema {
    name: "AttachWorkspaceParameters",
    description: "Mount the workflow workspace",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("at", Shape::String),
        FieldSpec::optional("name", Shape::String),
    ],
};

/// `add_ssh_keys` step.
pub static ADD_SSH_KEYS_PARAMETERS: EntitySchema = EntitySchema {
    name: "AddSshKeysParameters",
    description: "Install project SSH keys",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("fingerprints", Shape::ListOf(&Shape::String)),
        FieldSpec::optional("name", Shape::String),
    ],
};

/// `store_artifacts` step.
pub static STORE_ARTIFACTS_PARAMETERS: EntitySchema = EntitySchema {
    name: "StoreArtifactsParameters",
    description: "Upload build artifacts",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("path", Shape::String),
        FieldSpec::optional("destination", Shape::String),
        FieldSpec::optional("name", Shape::String),
    ],
};

/// `store_test_results` step.
pub static STORE_TEST_RESULTS_PARAMETERS: EntitySchema = EntitySchema {
    name: "StoreTestResultsParameters",
    description: "Upload test result files",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("path", Shape::String),
        FieldSpec::optional("name", Shape::String),
    ],
};

/// `setup_remote_docker` step.
pub static SETUP_REMOTE_DOCKER_PARAMETERS: EntitySchema = EntitySchema {
    name: "SetupRemoteDockerParameters",
    description: "Provision a remote Docker engine",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("version", Shape::String),
        FieldSpec::optional("name", Shape::String),
    ],
};

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

/// A workflow.
pub static WORKFLOW: EntitySchema = EntitySchema {
    name: "Workflow",
    description: "An ordered set of job invocations",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("jobs", Shape::ListOf(&Shape::WorkflowJob)),
        FieldSpec::optional("triggers", Shape::Any),
        FieldSpec::optional("when", Shape::Any),
        FieldSpec::optional("unless", Shape::Any),
    ],
};

/// Body of a workflow job entry. Undeclared keys are job parameters.
pub static WORKFLOW_JOB_PARAMETERS: EntitySchema = EntitySchema {
    name: "WorkflowJobParameters",
    description: "Scheduling options for one job in a workflow",
    openness: Openness::Open,
    executor: None,
    fields: &[
        FieldSpec::optional("name", Shape::String),
        FieldSpec::optional("requires", Shape::ListOf(&Shape::String)),
        FieldSpec::optional("context", Shape::StringList),
        FieldSpec::optional("type", Shape::Choice(WORKFLOW_JOB_TYPES)),
        FieldSpec::optional("filters", Shape::Entity(&FILTERS)),
        FieldSpec::optional("matrix", Shape::Entity(&MATRIX)),
    ],
};

/// Branch and tag filters.
pub static FILTERS: EntitySchema = EntitySchema {
    name: "Filters",
    description: "Branch and tag filters for a workflow job",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::optional("branches", Shape::Entity(&FILTER_RULE)),
        FieldSpec::optional("tags", Shape::Entity(&FILTER_RULE)),
    ],
};

/// One filter rule.
pub static FILTER_RULE: EntitySchema = EntitySchema {
    name: "FilterRule",
    description: "Names or patterns to include or exclude",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::optional("only", Shape::StringList),
        FieldSpec::optional("ignore", Shape::StringList),
    ],
};

/// Matrix expansion of a workflow job.
pub static MATRIX: EntitySchema = EntitySchema {
    name: "Matrix",
    description: "Run a job once per combination of parameter values",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("parameters", Shape::MapOf(&Shape::ListOf(&Shape::Any))),
        FieldSpec::optional("exclude", Shape::ListOf(&Shape::MapOf(&Shape::Any))),
        FieldSpec::optional("alias", Shape::String),
    ],
};

// ---------------------------------------------------------------------------
// Pipeline values
// ---------------------------------------------------------------------------

/// `pipeline.*` values available to a running configuration.
pub static PIPELINE: EntitySchema = EntitySchema {
    name: "Pipeline",
    description: "Pipeline values: id, number and parameters",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("id", Shape::String),
        FieldSpec::strict("_isLocal", Shape::Bool),
        FieldSpec::required("number", Shape::Integer),
        FieldSpec::required("parameters", Shape::ListOf(&PIPELINE_PARAMETER_SHAPE)),
    ],
};

/// A pipeline parameter with its declaration and passed value.
pub static PIPELINE_PARAMETER: EntitySchema = EntitySchema {
    name: "PipelineParameter",
    description: "A pipeline parameter and its value",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::optional("defaultValue", Shape::Any),
        FieldSpec::optional("enumValues", Shape::ListOf(&Shape::String)),
        FieldSpec::required("name", Shape::String),
        FieldSpec::required("parameterType", Shape::Choice(PARAMETER_TYPES)),
        FieldSpec::optional("value", Shape::Any),
    ],
};

/// `pipeline.git.*` values.
pub static GIT: EntitySchema = EntitySchema {
    name: "Git",
    description: "Revision information of the pipeline's trigger",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::strict("base_revision", Shape::String),
        FieldSpec::strict("branch", Shape::String),
        FieldSpec::strict("_isLocal", Shape::Bool),
        FieldSpec::required("revision", Shape::String),
        FieldSpec::strict("tag", Shape::String),
    ],
};

/// `pipeline.project.*` values.
pub static PROJECT: EntitySchema = EntitySchema {
    name: "Project",
    description: "Where the project is hosted",
    openness: Openness::Closed,
    executor: None,
    fields: &[
        FieldSpec::required("git_url", Shape::String),
        FieldSpec::strict("_isLocal", Shape::Bool),
        FieldSpec::required("vcs", Shape::String),
    ],
};

/// Every entity, in registry order.
pub static ALL: &[&EntitySchema] = &[
    &DOCUMENT,
    &ORB_IMPORT,
    &PARAMETER_DEFINITION,
    &COMMAND_DEFINITION,
    &EXECUTOR_DEFINITION,
    &JOB,
    &DOCKER_EXECUTOR,
    &MACHINE_EXECUTOR,
    &WINDOWS_EXECUTOR,
    &MACOS_EXECUTOR,
    &REFERENCED_EXECUTOR,
    &EXECUTOR_REFERENCE,
    &DOCKER_IMAGE,
    &DOCKER_AUTH,
    &DOCKER_AWS_AUTH,
    &MACHINE_IMAGE,
    &MACOS_VERSION,
    &RUN_PARAMETERS,
    &CHECKOUT_PARAMETERS,
    &SAVE_CACHE_PARAMETERS,
    &RESTORE_CACHE_PARAMETERS,
    &PERSIST_TO_WORKSPACE_PARAMETERS,
    &ATTACH_WORKSPACE_PARAMETERS,
    &ADD_SSH_KEYS_PARAMETERS,
    &STORE_ARTIFACTS_PARAMETERS,
    &STORE_TEST_RESULTS_PARAMETERS,
    &SETUP_REMOTE_DOCKER_PARAMETERS,
    &WORKFLOW,
    &WORKFLOW_JOB_PARAMETERS,
    &FILTERS,
    &FILTER_RULE,
    &MATRIX,
    &PIPELINE,
    &PIPELINE_PARAMETER,
    &GIT,
    &PROJECT,
];
