pub mod argparse;
pub mod commands;
pub mod utils;

use std::path::PathBuf;

/// Environment variable naming the schema file when `--schema` is absent
pub const SCHEMA_ENV_VAR: &str = "SQ_SCHEMA";

/// User-facing CLI failures
#[derive(Debug)]
pub enum CliError {
    SchemaLoad(PathBuf, anyhow::Error),
    InputRead(PathBuf, std::io::Error),
    InvalidInput(PathBuf, serde_json::Error),
    InvalidParam(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::SchemaLoad(path, e) => {
                write!(
                    f,
                    "Failed to load schema {}: {e:#}\n\nPossible fixes:\n  - Check that the file exists and is valid JSON (.json) or YAML\n  - Every enumeration attribute needs a non-empty 'labels' list\n  - Use --schema or set {} to point to another file",
                    path.display(),
                    SCHEMA_ENV_VAR
                )
            }
            CliError::InputRead(path, e) => {
                write!(
                    f,
                    "Failed to read input file {}: {e}\n\nCheck the path and file permissions given to --input.",
                    path.display()
                )
            }
            CliError::InvalidInput(path, e) => {
                write!(
                    f,
                    "Input file {} is not valid JSON: {e}\n\nThe file must hold one JSON document or an array of documents.",
                    path.display()
                )
            }
            CliError::InvalidParam(param) => {
                write!(
                    f,
                    "Invalid parameter: '{}'\n\nParameters are written as key=value, e.g. lastName=DOE or 'age[ge]=20'.",
                    param
                )
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::SchemaLoad(_, e) => Some(e.as_ref()),
            CliError::InputRead(_, e) => Some(e),
            CliError::InvalidInput(_, e) => Some(e),
            CliError::InvalidParam(_) => None,
        }
    }
}
