//! Property-based tests for entity encoding.
//!
//! - Executors: every variant survives encoding inside its job
//! - Workflow jobs: options, filters, matrices and job parameters survive
//! - Orb imports and parameter declarations decode back to themselves

use ccvalidator_core::schema::Shape;
use ccvalidator_core::{
    Codec, DockerAuth, DockerExecutor, DockerImage, Executor, ExecutorReference, FilterRule,
    Filters, Job, MacOsExecutor, MacOsVersion, MachineExecutor, MachineImage, Matrix, Mode,
    OrbImport, OrbImports, ParameterDefinition, ParameterType, Parameters, ReferencedExecutor,
    Step, StringList, WindowsExecutor, WorkflowJob, WorkflowJobParameters, WorkflowJobType,
};
use indexmap::IndexMap;
use proptest::prelude::*;
use serde_json::Value;

// =============================================================================
// Strategies
// =============================================================================

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}".prop_map(String::from)
}

fn image_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}/[a-z]{1,10}:[0-9]{1,2}\\.[0-9]{1,2}".prop_map(String::from)
}

fn resource_class_strategy() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(prop_oneof![
        Just("small".to_string()),
        Just("medium".to_string()),
        Just("large".to_string()),
        Just("arm.medium".to_string()),
    ])
}

fn shell_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("/bin/bash -eo pipefail".to_string()),
        Just("/bin/sh".to_string()),
        Just("powershell.exe".to_string()),
    ]
}

/// Scalars only: a null would read back as an absent key.
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z0-9.]{0,10}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

fn string_list_strategy() -> impl Strategy<Value = StringList> {
    prop::collection::vec(name_strategy(), 1..4).prop_map(StringList::from)
}

/// Keys that cannot collide with a declared field.
fn extra_key_strategy() -> impl Strategy<Value = String> {
    "x_[a-z0-9_]{1,10}".prop_map(String::from)
}

fn docker_image_strategy() -> impl Strategy<Value = DockerImage> {
    (
        image_strategy(),
        proptest::option::of(name_strategy()),
        proptest::option::of(prop::collection::vec(
            ("[A-Z][A-Z0-9_]{0,10}", "[a-z0-9]{0,8}"),
            1..3,
        )),
        proptest::option::of((name_strategy(), "\\$[A-Z_]{1,12}")),
    )
        .prop_map(|(image, name, environment, auth)| DockerImage {
            name,
            environment: environment.map(|vars| vars.into_iter().collect()),
            auth: auth.map(|(username, password)| DockerAuth { username, password }),
            ..DockerImage::new(image)
        })
}

fn machine_image_strategy() -> impl Strategy<Value = MachineImage> {
    (image_strategy(), proptest::option::of(any::<bool>())).prop_map(
        |(image, docker_layer_caching)| MachineImage {
            image,
            docker_layer_caching,
        },
    )
}

fn executor_reference_strategy() -> impl Strategy<Value = ExecutorReference> {
    (
        name_strategy(),
        prop::collection::vec((extra_key_strategy(), scalar_strategy()), 0..4),
    )
        .prop_map(|(name, params)| ExecutorReference {
            name,
            parameters: params.into_iter().collect::<Parameters>(),
        })
}

fn executor_strategy() -> impl Strategy<Value = Executor> {
    prop_oneof![
        (
            prop::collection::vec(docker_image_strategy(), 1..3),
            resource_class_strategy(),
            proptest::option::of(shell_strategy()),
        )
            .prop_map(|(docker, resource_class, shell)| {
                Executor::Docker(DockerExecutor {
                    docker,
                    resource_class,
                    shell,
                })
            }),
        (machine_image_strategy(), resource_class_strategy()).prop_map(
            |(machine, resource_class)| {
                Executor::Machine(MachineExecutor {
                    machine,
                    resource_class,
                })
            }
        ),
        (machine_image_strategy(), shell_strategy(), resource_class_strategy()).prop_map(
            |(machine, shell, resource_class)| {
                Executor::Windows(WindowsExecutor {
                    machine,
                    shell,
                    resource_class,
                })
            }
        ),
        (
            "[0-9]{2}\\.[0-9]\\.[0-9]",
            resource_class_strategy(),
            proptest::option::of(shell_strategy()),
        )
            .prop_map(|(xcode, resource_class, shell)| {
                Executor::MacOs(MacOsExecutor {
                    macos: MacOsVersion { xcode },
                    resource_class,
                    shell,
                })
            }),
        (
            executor_reference_strategy(),
            resource_class_strategy(),
            proptest::option::of(shell_strategy()),
        )
            .prop_map(|(executor, resource_class, shell)| {
                Executor::Reference(ReferencedExecutor {
                    executor,
                    resource_class,
                    shell,
                })
            }),
    ]
}

fn filter_rule_strategy() -> impl Strategy<Value = FilterRule> {
    (
        proptest::option::of(string_list_strategy()),
        proptest::option::of(string_list_strategy()),
    )
        .prop_map(|(only, ignore)| FilterRule { only, ignore })
}

fn filters_strategy() -> impl Strategy<Value = Filters> {
    (
        proptest::option::of(filter_rule_strategy()),
        proptest::option::of(filter_rule_strategy()),
    )
        .prop_map(|(branches, tags)| Filters { branches, tags })
}

fn matrix_strategy() -> impl Strategy<Value = Matrix> {
    (
        prop::collection::vec(
            (name_strategy(), prop::collection::vec(scalar_strategy(), 1..4)),
            1..3,
        ),
        proptest::option::of(prop::collection::vec(
            prop::collection::vec((name_strategy(), scalar_strategy()), 1..3),
            1..3,
        )),
        proptest::option::of(name_strategy()),
    )
        .prop_map(|(parameters, exclude, alias)| Matrix {
            parameters: parameters.into_iter().collect(),
            exclude: exclude.map(|rows| {
                rows.into_iter()
                    .map(|row| row.into_iter().collect::<IndexMap<_, _>>())
                    .collect()
            }),
            alias,
        })
}

fn workflow_job_parameters_strategy() -> impl Strategy<Value = WorkflowJobParameters> {
    (
        proptest::option::of(name_strategy()),
        proptest::option::of(prop::collection::vec(name_strategy(), 0..4)),
        proptest::option::of(string_list_strategy()),
        proptest::option::of(Just(WorkflowJobType::Approval)),
        proptest::option::of(filters_strategy()),
        proptest::option::of(matrix_strategy()),
        prop::collection::vec((extra_key_strategy(), scalar_strategy()), 0..3),
    )
        .prop_map(
            |(name, requires, context, job_type, filters, matrix, extra)| WorkflowJobParameters {
                name,
                requires,
                context,
                job_type,
                filters,
                matrix,
                additional_properties: extra.into_iter().collect(),
            },
        )
}

fn workflow_job_strategy() -> impl Strategy<Value = WorkflowJob> {
    (
        name_strategy(),
        proptest::option::of(workflow_job_parameters_strategy()),
    )
        .prop_map(|(job, parameters)| WorkflowJob { job, parameters })
}

fn orb_imports_strategy() -> impl Strategy<Value = OrbImports> {
    prop::collection::btree_map(
        name_strategy(),
        "[a-z]{1,10}/[a-z-]{1,12}@[0-9]{1,2}\\.[0-9]{1,2}",
        0..5,
    )
    .prop_map(|orbs| {
        OrbImports(
            orbs.into_iter()
                .map(|(alias, import)| OrbImport { alias, import })
                .collect(),
        )
    })
}

fn parameter_definition_strategy() -> impl Strategy<Value = ParameterDefinition> {
    (
        prop_oneof![
            Just(ParameterType::String),
            Just(ParameterType::Boolean),
            Just(ParameterType::Integer),
            Just(ParameterType::Enum),
            Just(ParameterType::Executor),
            Just(ParameterType::Steps),
            Just(ParameterType::EnvVarName),
        ],
        proptest::option::of("[ -~]{0,30}"),
        proptest::option::of(scalar_strategy()),
        proptest::option::of(prop::collection::vec(name_strategy(), 1..4)),
    )
        .prop_map(
            |(parameter_type, description, default, allowed)| ParameterDefinition {
                parameter_type,
                description,
                default,
                allowed,
            },
        )
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Strict mode additionally needs a resource class on non-reference executors.
    #[test]
    fn job_executor_round_trips(executor in executor_strategy()) {
        let job = Job::new(executor, vec![Step::reference("checkout")]);
        let strict_ok = job.executor.resource_class().is_some()
            || matches!(job.executor, Executor::Reference(_));

        for mode in [Mode::Permissive, Mode::Strict] {
            let codec = Codec::new(mode);
            let encoded = codec.encode(&job);
            if mode == Mode::Strict && !strict_ok {
                prop_assert!(encoded.is_err());
                continue;
            }
            let encoded = encoded.unwrap();
            let decoded: Job = codec.decode(&encoded).unwrap();
            prop_assert_eq!(&decoded, &job);
            prop_assert_eq!(decoded.executor.variant(), job.executor.variant());
        }
    }

    #[test]
    fn workflow_job_round_trips(entry in workflow_job_strategy()) {
        for mode in [Mode::Permissive, Mode::Strict] {
            let codec = Codec::new(mode);
            let encoded = codec.encode_shape(&entry, &Shape::WorkflowJob).unwrap();
            let decoded: WorkflowJob = codec.decode_shape(&encoded, &Shape::WorkflowJob).unwrap();
            prop_assert_eq!(&decoded, &entry);
        }
    }

    #[test]
    fn orb_imports_round_trip(orbs in orb_imports_strategy()) {
        let codec = Codec::default();
        let encoded = codec.encode_shape(&orbs, &Shape::OrbImports).unwrap();
        prop_assert_eq!(encoded.as_array().map(Vec::len), Some(orbs.0.len()));
        let decoded: OrbImports = codec.decode_shape(&encoded, &Shape::OrbImports).unwrap();
        prop_assert_eq!(&decoded, &orbs);
    }

    /// The `alias: import` map form reads back as the same imports.
    #[test]
    fn orb_import_map_form_matches_list(orbs in orb_imports_strategy()) {
        let map: serde_json::Map<String, Value> = orbs
            .iter()
            .map(|orb| (orb.alias.clone(), Value::String(orb.import.clone())))
            .collect();
        let decoded: OrbImports = Codec::default()
            .decode_shape(&Value::Object(map), &Shape::OrbImports)
            .unwrap();
        prop_assert_eq!(&decoded, &orbs);
    }

    #[test]
    fn parameter_definition_round_trips(parameter in parameter_definition_strategy()) {
        for mode in [Mode::Permissive, Mode::Strict] {
            let codec = Codec::new(mode);
            let encoded = codec.encode(&parameter).unwrap();
            let decoded: ParameterDefinition = codec.decode(&encoded).unwrap();
            prop_assert_eq!(&decoded, &parameter);
        }
    }
}
