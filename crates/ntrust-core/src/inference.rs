//! Target inference: which provider, repository and pipeline file to trust.
//!
//! Explicit values always win. Missing values are read from the git remote of
//! the repository containing the working directory, and the pipeline file is
//! found by scanning the provider's pipeline definitions for exactly one
//! publish step. Several candidates are never guessed between.

use std::path::PathBuf;

use crate::error::TrustError;
use crate::git;
use crate::pipeline::{PublishStep, scanner_for};
use crate::types::{DesiredBinding, Provider};

/// Values supplied by the caller; `None` means "infer it".
#[derive(Debug, Clone, Default)]
pub struct InferenceOptions {
    /// Working directory (defaults to the process cwd)
    pub dir: Option<PathBuf>,
    pub provider: Option<Provider>,
    pub repo: Option<String>,
    pub file: Option<String>,
}

impl InferenceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Infer the binding every package should end up with.
pub fn infer_target(options: &InferenceOptions) -> Result<DesiredBinding, TrustError> {
    let cwd = match &options.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| {
            TrustError::Inference(format!("Unable to determine working directory: {}", e))
        })?,
    };
    let repo_root = git::resolve_repo_root(&cwd);

    let remote = if options.provider.is_none() || options.repo.is_none() {
        Some(git::default_remote_url(&repo_root)?)
    } else {
        None
    };
    let remote = remote.as_deref().unwrap_or_default();

    let provider = match options.provider {
        Some(provider) => provider,
        None => git::infer_provider_from_remote(remote)?,
    };
    if provider == Provider::GitLab {
        return Err(TrustError::NotImplemented(
            "GitLab provider is not implemented yet.".to_string(),
        ));
    }

    let repository = match &options.repo {
        Some(repo) => repo.trim().to_string(),
        None => git::parse_repo_from_remote(remote)?,
    };
    git::validate_repo_identity(&repository)?;

    let pipeline_file = match &options.file {
        Some(file) => file.clone(),
        None => infer_pipeline_file(provider, &repo_root)?,
    };

    tracing::debug!(
        provider = %provider,
        repository = %repository,
        file = %pipeline_file,
        root = %repo_root.display(),
        "inferred trust target"
    );

    Ok(DesiredBinding {
        provider,
        repository,
        pipeline_file,
    })
}

fn infer_pipeline_file(
    provider: Provider,
    repo_root: &std::path::Path,
) -> Result<String, TrustError> {
    let scanner = scanner_for(provider)?;
    let matches = scanner.scan(repo_root)?;

    match matches.as_slice() {
        [] => Err(TrustError::Inference(
            "Unable to find any workflow. Please specify --file manually.".to_string(),
        )),
        [only] => Ok(only.file.clone()),
        _ => Err(TrustError::Inference(format!(
            "Found multiple publish workflow commands in {}. Please specify --file manually.\n{}",
            scanner.label(),
            format_candidates(&matches)
        ))),
    }
}

fn format_candidates(matches: &[PublishStep]) -> String {
    matches
        .iter()
        .map(|m| format!("- {}", m))
        .collect::<Vec<_>>()
        .join("\n")
}
