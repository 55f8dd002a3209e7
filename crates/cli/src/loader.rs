//! Reading configuration input and parsing it into a value tree.

use crate::cli::CliError;
use serde_json::Value;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Where a configuration document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Standard input
    Stdin,
    /// A file on disk
    File(PathBuf),
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        if path.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::File(path)
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Surface syntax of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Yaml,
    Json,
}

impl InputFormat {
    /// Pick the parser from the file extension. YAML is a superset of JSON,
    /// so anything not named `.json` goes through the YAML parser.
    #[must_use]
    pub fn detect(source: &Source) -> Self {
        match source {
            Source::File(path) if has_json_extension(path) => Self::Json,
            _ => Self::Yaml,
        }
    }
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Read the raw text of `source`.
pub fn read(source: &Source) -> Result<String, CliError> {
    match source {
        Source::Stdin => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| CliError::config(format!("Failed to read stdin: {e}")))?;
            Ok(text)
        }
        Source::File(path) => std::fs::read_to_string(path).map_err(|e| {
            CliError::config_with_help(
                format!("Failed to read {}: {e}", path.display()),
                "Pass a readable file path, or `-` to read from stdin",
            )
        }),
    }
}

/// Parse `text` into a value tree.
///
/// The error carries the parser's message unchanged.
pub fn parse(text: &str, format: InputFormat) -> Result<Value, String> {
    match format {
        InputFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        InputFormat::Yaml => {
            let mut yaml: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|e| e.to_string())?;
            yaml.apply_merge().map_err(|e| e.to_string())?;
            serde_json::to_value(yaml).map_err(|e| e.to_string())
        }
    }
}

/// Read and parse `source`.
///
/// Read failures are CLI errors; parse failures are returned inside the
/// `Ok` so the validator can report them as malformed input.
#[instrument(skip_all, fields(source = %source))]
pub fn load(source: &Source) -> Result<Result<Value, String>, CliError> {
    let text = read(source)?;
    let format = InputFormat::detect(source);
    debug!(?format, bytes = text.len(), "parsing input");
    Ok(parse(&text, format))
}
