//! Error taxonomy for inference, registry calls and batch reconciliation.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::OperationRecord;

/// Failures of the external `npm` client.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to spawn command \"{command}\": {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Failed to run command \"{command}\" (exit={})\n{message}",
        .exit_code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string())
    )]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        message: String,
    },

    #[error("Command \"{command}\" timed out after {secs} seconds")]
    Timeout { command: String, secs: u64 },

    #[error(
        "npm version {required} or newer is required, but got {found}. Please upgrade npm first."
    )]
    VersionBelowMinimum {
        required: semver::Version,
        found: semver::Version,
    },

    #[error("Unable to parse npm version from \"{0}\"")]
    InvalidVersion(String),

    #[error("Failed to start process runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Failures of a single trust step.
#[derive(Debug, Error)]
pub enum TrustError {
    /// Provider, repository or pipeline file could not be determined.
    #[error("{0}")]
    Inference(String),

    #[error("{0}")]
    NotImplemented(String),

    #[error("Failed to parse pipeline definition {}: {message}", .path.display())]
    InvalidPipeline { path: PathBuf, message: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Unexpected `npm trust list` output for {package}: {source}")]
    MalformedResponse {
        package: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Operation cancelled by user.")]
    Cancelled,

    #[error("This command requires confirmation. Re-run with --yes in non-interactive mode.")]
    NonInteractive,

    #[error("Failed to read confirmation: {0}")]
    Prompt(String),
}

/// Terminating error of a batch call.
///
/// Keeps the records produced before the failure so the caller can show which
/// packages were already changed.
#[derive(Debug, Error)]
#[error(
    "{}",
    .package.as_ref()
        .map(|p| format!("Trust batch aborted at package {p}"))
        .unwrap_or_else(|| "Trust batch aborted".to_string())
)]
pub struct BatchError {
    pub package: Option<String>,
    pub records: Vec<OperationRecord>,
    #[source]
    pub source: TrustError,
}

impl BatchError {
    pub fn new(package: Option<&str>, records: Vec<OperationRecord>, source: TrustError) -> Self {
        Self {
            package: package.map(str::to_string),
            records,
            source,
        }
    }
}
