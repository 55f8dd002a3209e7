use crate::commands::Command;
use crate::loader::Source;
use crate::logging::{LogLevel, TracingFormat};
use ccvalidator_core::{DecodeError, Mode};
use clap::{Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, Report};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// The document is well-formed
pub const EXIT_OK: i32 = 0;
/// The document violates the configuration schema
pub const EXIT_INVALID: i32 = 1;
/// The input could not be read or parsed, or the command line was wrong
pub const EXIT_CLI: i32 = 2;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// The document was parsed but is not well-formed (exit code 1)
    #[error(transparent)]
    #[diagnostic(transparent)]
    Invalid(#[from] DecodeError),

    /// The input is not valid YAML or JSON (exit code 2)
    #[error("Malformed input: {message}")]
    #[diagnostic(code(ccvalidator::cli::malformed))]
    Malformed {
        /// Parser message, unchanged
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },

    /// CLI or I/O error (exit code 2)
    #[error("CLI error: {message}")]
    #[diagnostic(code(ccvalidator::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new malformed-input error
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            help: Some("Check that the file is valid YAML or JSON".to_string()),
        }
    }

    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Short machine-readable category
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid",
            Self::Malformed { .. } => "malformed",
            Self::Config { .. } => "config",
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Invalid(_) => EXIT_INVALID,
        CliError::Malformed { .. } | CliError::Config { .. } => EXIT_CLI,
    }
}

/// Error payload of the JSON error envelope
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    /// Error category
    pub code: &'static str,
    /// Decode error kind, for invalid documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ccvalidator_core::ErrorKind>,
    /// Path of the offending value, for invalid documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Offending field, for invalid documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl From<&CliError> for ErrorDetail {
    fn from(err: &CliError) -> Self {
        let decode = match err {
            CliError::Invalid(decode) => Some(decode),
            _ => None,
        };
        Self {
            code: err.category(),
            kind: decode.map(DecodeError::kind),
            path: decode.map(|d| d.path().to_string()),
            field: decode.and_then(DecodeError::field).map(str::to_string),
            message: err.to_string(),
        }
    }
}

/// Render error appropriately based on JSON flag
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(ErrorDetail::from(err));
        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Output format for validation results
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, ValueEnum)]
pub enum OutputFormat {
    /// Plain text summary
    #[default]
    Text,
    /// JSON envelope
    Json,
}

/// Serialization format for normalized documents
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, ValueEnum)]
pub enum DocumentFormat {
    /// YAML
    #[default]
    Yaml,
    /// Pretty-printed JSON
    Json,
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Validate CircleCI configuration files.
#[derive(Parser, Debug)]
#[command(name = "ccvalidator")]
#[command(about = "Validate CircleCI configuration files")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        env = "CCVALIDATOR_LOG_LEVEL",
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,
}

impl Cli {
    /// Whether errors should be rendered as a JSON envelope
    #[must_use]
    pub const fn json_errors(&self) -> bool {
        matches!(
            self.command,
            Commands::Validate {
                output: OutputFormat::Json,
                ..
            }
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Check that a configuration file is well-formed")]
    Validate {
        #[arg(help = "Configuration file, or `-` for stdin")]
        path: PathBuf,
        #[arg(
            long,
            env = "CCVALIDATOR_STRICT",
            help = "Require schema-only fields such as setup and resource_class"
        )]
        strict: bool,
        #[arg(
            short = 'o',
            long = "output",
            help = "Result format",
            default_value = "text",
            value_enum
        )]
        output: OutputFormat,
    },
    #[command(about = "Validate a configuration file and print its canonical form")]
    Normalize {
        #[arg(help = "Configuration file, or `-` for stdin")]
        path: PathBuf,
        #[arg(
            long,
            env = "CCVALIDATOR_STRICT",
            help = "Require schema-only fields such as setup and resource_class"
        )]
        strict: bool,
        #[arg(long, help = "Output format", default_value = "yaml", value_enum)]
        to: DocumentFormat,
    },
    #[command(about = "Print entity schema metadata as JSON")]
    Schema {
        #[arg(help = "Entity name; lists every entity when omitted")]
        entity: Option<String>,
    },
}

const fn mode(strict: bool) -> Mode {
    if strict { Mode::Strict } else { Mode::Permissive }
}

impl From<Commands> for Command {
    fn from(cmd: Commands) -> Self {
        match cmd {
            Commands::Validate {
                path,
                strict,
                output,
            } => Self::Validate {
                source: Source::from(path),
                mode: mode(strict),
                output,
            },
            Commands::Normalize { path, strict, to } => Self::Normalize {
                source: Source::from(path),
                mode: mode(strict),
                to,
            },
            Commands::Schema { entity } => Self::Schema { entity },
        }
    }
}
