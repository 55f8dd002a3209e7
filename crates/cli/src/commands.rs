use crate::cli::{CliError, DocumentFormat, OkEnvelope, OutputFormat};
use crate::loader::{self, Source};
use ccvalidator_core::{Document, Mode, Outcome, Registry, Validator};
use serde::Serialize;
use std::io::Write;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Validate {
        source: Source,
        mode: Mode,
        output: OutputFormat,
    },
    Normalize {
        source: Source,
        mode: Mode,
        to: DocumentFormat,
    },
    Schema {
        entity: Option<String>,
    },
}

/// Summary printed for a well-formed document.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub source: String,
    pub mode: String,
    pub version: f64,
    pub jobs: Vec<String>,
    pub workflows: Vec<String>,
}

impl ValidationSummary {
    fn new(source: &Source, mode: Mode, document: &Document) -> Self {
        Self {
            source: source.to_string(),
            mode: mode.to_string(),
            version: document.version,
            jobs: document.jobs.keys().cloned().collect(),
            workflows: document.workflows.keys().cloned().collect(),
        }
    }
}

/// Run `command`, writing its output to `out`.
pub fn execute(command: Command, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        Command::Validate {
            source,
            mode,
            output,
        } => validate(&source, mode, output, out),
        Command::Normalize { source, mode, to } => normalize(&source, mode, to, out),
        Command::Schema { entity } => schema(entity.as_deref(), out),
    }
}

fn check(source: &Source, validator: Validator) -> Result<Document, CliError> {
    match validator.validate_input(loader::load(source)?) {
        Outcome::Valid(document) => Ok(*document),
        Outcome::Invalid(err) => Err(err.into()),
        Outcome::MalformedInput(message) => Err(CliError::malformed(message)),
    }
}

#[instrument(skip(out))]
fn validate(
    source: &Source,
    mode: Mode,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let document = check(source, Validator::new(mode))?;
    let summary = ValidationSummary::new(source, mode, &document);
    info!(jobs = summary.jobs.len(), workflows = summary.workflows.len(), "valid");

    match output {
        OutputFormat::Text => writeln!(
            out,
            "valid: {} ({} jobs, {} workflows)",
            summary.source,
            summary.jobs.len(),
            summary.workflows.len()
        )
        .map_err(write_error),
        OutputFormat::Json => write_json(out, &OkEnvelope::new(summary)),
    }
}

#[instrument(skip(out))]
fn normalize(
    source: &Source,
    mode: Mode,
    to: DocumentFormat,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let validator = Validator::new(mode);
    let document = check(source, validator)?;
    let canonical = validator.encode(&document)?;

    match to {
        DocumentFormat::Json => write_json(out, &canonical),
        DocumentFormat::Yaml => {
            let text = serde_yaml::to_string(&canonical)
                .map_err(|e| CliError::config(format!("Failed to serialize YAML: {e}")))?;
            out.write_all(text.as_bytes()).map_err(write_error)
        }
    }
}

fn schema(entity: Option<&str>, out: &mut impl Write) -> Result<(), CliError> {
    let registry = Registry::global();
    match entity {
        None => write_json(out, &registry.iter().collect::<Vec<_>>()),
        Some(name) => {
            let schema = registry.get(name).ok_or_else(|| {
                CliError::config_with_help(
                    format!("Unknown entity '{name}'"),
                    format!(
                        "Known entities: {}",
                        registry.names().collect::<Vec<_>>().join(", ")
                    ),
                )
            })?;
            write_json(out, schema)
        }
    }
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::config(format!("Failed to serialize JSON: {e}")))?;
    writeln!(out, "{json}").map_err(write_error)
}

fn write_error(err: std::io::Error) -> CliError {
    CliError::config(format!("Failed to write output: {err}"))
}
