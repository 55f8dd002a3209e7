//! Executors: the runtime a job's steps run in.

use super::{Parameters, StringList, from_json};
use crate::error::{DecodeError, FieldPath};
use crate::resolver::{self, EXECUTOR_KEYS, ExecutorVariant};
use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Container image in a docker executor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerImage {
    /// Image reference, e.g. `cimg/rust:1.80`
    pub image: String,

    /// Hostname on the job network
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Entrypoint override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<StringList>,

    /// Command override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<StringList>,

    /// User to run as
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Container environment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<IndexMap<String, String>>,

    /// Registry credentials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<DockerAuth>,

    /// ECR credentials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_auth: Option<DockerAwsAuth>,
}

impl DockerImage {
    /// An image with no overrides.
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Self::default()
        }
    }
}

/// Registry credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerAuth {
    /// Registry user
    pub username: String,
    /// Registry password, usually an environment reference
    pub password: String,
}

/// ECR credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerAwsAuth {
    /// Access key id
    pub aws_access_key_id: String,
    /// Secret access key
    pub aws_secret_access_key: String,
}

/// Virtual machine image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineImage {
    /// Image name
    pub image: String,

    /// Reuse Docker layers between runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_layer_caching: Option<bool>,
}

/// macOS Xcode selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacOsVersion {
    /// Xcode version
    pub xcode: String,
}

/// Docker executor keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerExecutor {
    /// Images; steps run in the first
    pub docker: Vec<DockerImage>,

    /// Resource class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_class: Option<String>,

    /// Shell override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

/// Linux machine executor keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineExecutor {
    /// Machine image
    pub machine: MachineImage,

    /// Resource class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_class: Option<String>,
}

/// Windows executor keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowsExecutor {
    /// Machine image
    pub machine: MachineImage,

    /// Shell, e.g. `powershell.exe`
    pub shell: String,

    /// Resource class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_class: Option<String>,
}

/// macOS executor keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacOsExecutor {
    /// Xcode selection
    pub macos: MacOsVersion,

    /// Resource class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_class: Option<String>,

    /// Shell override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

/// Reference to an entry of the document's `executors` section.
///
/// Serializes as the bare name when there are no parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutorReference {
    /// Executor name
    pub name: String,
    /// Parameter values
    pub parameters: Parameters,
}

impl ExecutorReference {
    /// A reference without parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Parameters::new(),
        }
    }
}

impl Serialize for ExecutorReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.parameters.is_empty() {
            return serializer.serialize_str(&self.name);
        }
        let mut map = serializer.serialize_map(Some(self.parameters.len() + 1))?;
        map.serialize_entry("name", &self.name)?;
        for (key, value) in &self.parameters {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ExecutorReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(name) => Ok(Self::new(name)),
            Value::Object(map) => {
                let mut name = None;
                let mut parameters = Parameters::new();
                for (key, value) in map {
                    if key == "name" {
                        name = Some(value);
                    } else {
                        parameters.insert(key, value);
                    }
                }
                match name {
                    Some(Value::String(name)) => Ok(Self { name, parameters }),
                    Some(_) => Err(de::Error::custom("executor `name` must be a string")),
                    None => Err(de::Error::missing_field("name")),
                }
            }
            _ => Err(de::Error::custom(
                "expected an executor name or a map with `name`",
            )),
        }
    }
}

/// Keys of a job that uses a named executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferencedExecutor {
    /// The referenced executor
    pub executor: ExecutorReference,

    /// Resource class override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_class: Option<String>,

    /// Shell override for the job's steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

/// The runtime a job's steps run in.
///
/// Flattened into its owner: the variant is chosen by which executor keys
/// the owner's map contains.
#[derive(Debug, Clone, PartialEq)]
pub enum Executor {
    /// Docker containers
    Docker(DockerExecutor),
    /// Linux virtual machine
    Machine(MachineExecutor),
    /// Windows virtual machine
    Windows(WindowsExecutor),
    /// macOS virtual machine
    MacOs(MacOsExecutor),
    /// Named executor
    Reference(ReferencedExecutor),
}

impl Executor {
    /// A docker executor running `image`.
    #[must_use]
    pub fn docker(image: impl Into<String>) -> Self {
        Self::Docker(DockerExecutor {
            docker: vec![DockerImage::new(image)],
            ..DockerExecutor::default()
        })
    }

    /// Variant tag.
    #[must_use]
    pub const fn variant(&self) -> ExecutorVariant {
        match self {
            Self::Docker(_) => ExecutorVariant::Docker,
            Self::Machine(_) => ExecutorVariant::Machine,
            Self::Windows(_) => ExecutorVariant::Windows,
            Self::MacOs(_) => ExecutorVariant::MacOs,
            Self::Reference(_) => ExecutorVariant::Reference,
        }
    }

    /// Resource class, if set.
    #[must_use]
    pub fn resource_class(&self) -> Option<&str> {
        match self {
            Self::Docker(e) => e.resource_class.as_deref(),
            Self::Machine(e) => e.resource_class.as_deref(),
            Self::Windows(e) => e.resource_class.as_deref(),
            Self::MacOs(e) => e.resource_class.as_deref(),
            Self::Reference(e) => e.resource_class.as_deref(),
        }
    }

    /// The image steps run in, for docker and machine executors.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        match self {
            Self::Docker(e) => e.docker.first().map(|image| image.image.as_str()),
            Self::Machine(MachineExecutor { machine, .. })
            | Self::Windows(WindowsExecutor { machine, .. }) => Some(machine.image.as_str()),
            Self::MacOs(_) | Self::Reference(_) => None,
        }
    }

    /// Build an executor from the executor keys of a map.
    ///
    /// Keys that do not belong to an executor are ignored.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, DecodeError> {
        let path = FieldPath::root();
        let variant = resolver::resolve_executor_variant(map, true, &path)?;
        let keys: Map<String, Value> = map
            .iter()
            .filter(|(key, _)| EXECUTOR_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let value = Value::Object(keys);

        Ok(match variant {
            ExecutorVariant::Docker => Self::Docker(from_json(value, &path)?),
            ExecutorVariant::Machine => Self::Machine(from_json(value, &path)?),
            ExecutorVariant::Windows => Self::Windows(from_json(value, &path)?),
            ExecutorVariant::MacOs => Self::MacOs(from_json(value, &path)?),
            ExecutorVariant::Reference => Self::Reference(from_json(value, &path)?),
        })
    }
}

impl Serialize for Executor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Docker(e) => e.serialize(serializer),
            Self::Machine(e) => e.serialize(serializer),
            Self::Windows(e) => e.serialize(serializer),
            Self::MacOs(e) => e.serialize(serializer),
            Self::Reference(e) => e.serialize(serializer),
        }
    }
}

struct ExecutorVisitor;

impl<'de> Visitor<'de> for ExecutorVisitor {
    type Value = Executor;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map with executor keys")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Executor, A::Error> {
        let mut map = Map::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Executor::from_map(&map).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Executor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Naming the executor keys as struct fields lets a flattened executor
        // claim only those keys from its owner.
        deserializer.deserialize_struct("Executor", EXECUTOR_KEYS, ExecutorVisitor)
    }
}

/// A reusable executor from the `executors` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorDefinition {
    /// Runtime keys
    #[serde(flatten)]
    pub executor: Executor,

    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, super::ParameterDefinition>>,

    /// Environment variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<IndexMap<String, String>>,

    /// Default working directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
}
