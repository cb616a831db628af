//! Pipeline definition scanning for publish steps.
//!
//! Each provider has a [`PublishStepScanner`] that knows where its pipeline
//! definitions live and how steps are laid out. Scanners only report
//! candidates; picking one of them is up to target inference.

mod github;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use github::GitHubWorkflows;

use crate::error::TrustError;
use crate::types::Provider;

/// A step whose command body runs a direct package publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishStep {
    /// File name relative to the pipeline-definitions directory
    pub file: String,
    pub job: String,
    /// 1-based step index within the job
    pub step: usize,
    pub command: String,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (job={}, step={}): {}",
            self.file, self.job, self.step, self.command
        )
    }
}

/// Lists candidate publish steps found in a repository's pipeline definitions.
pub trait PublishStepScanner {
    /// Human-readable name used in error messages (e.g., "GitHub actions").
    fn label(&self) -> &'static str;

    fn scan(&self, repo_root: &Path) -> Result<Vec<PublishStep>, TrustError>;
}

/// Select the scanner for a provider.
pub fn scanner_for(provider: Provider) -> Result<&'static dyn PublishStepScanner, TrustError> {
    match provider {
        Provider::GitHub => Ok(&GitHubWorkflows),
        Provider::GitLab => Err(TrustError::NotImplemented(
            "GitLab pipeline scanning is not implemented yet.".to_string(),
        )),
    }
}

/// Package managers whose `publish` subcommand uploads to the npm registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
}

impl FromStr for PackageManager {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "npm" => Ok(PackageManager::Npm),
            "pnpm" => Ok(PackageManager::Pnpm),
            "yarn" => Ok(PackageManager::Yarn),
            _ => Err(()),
        }
    }
}

/// Split a step's command body into individual commands.
///
/// Separators: newlines, `&&`, `||` and `;`.
pub fn split_run_command(run: &str) -> Vec<String> {
    run.replace("&&", "\n")
        .replace("||", "\n")
        .replace(';', "\n")
        .lines()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a single command is `<package manager> [flags] publish ...`.
pub fn is_direct_publish_command(command: &str) -> bool {
    let mut tokens = command.split_whitespace();

    let Some(program) = tokens.next() else {
        return false;
    };
    if program.parse::<PackageManager>().is_err() {
        return false;
    }

    tokens.find(|token| !token.starts_with('-')) == Some("publish")
}
