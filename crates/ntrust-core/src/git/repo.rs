//! Local repository inspection through libgit2.

use std::path::{Path, PathBuf};

use git2::Repository;

use crate::error::TrustError;

const DEFAULT_REMOTE: &str = "origin";

/// Resolve the work tree root containing `cwd`.
///
/// Falls back to `cwd` itself when no repository is found.
pub fn resolve_repo_root(cwd: &Path) -> PathBuf {
    match Repository::discover(cwd) {
        Ok(repo) => match repo.workdir() {
            // workdir() carries a trailing separator
            Some(workdir) => workdir
                .to_path_buf()
                .components()
                .collect::<PathBuf>(),
            None => {
                tracing::debug!(path = %cwd.display(), "repository is bare, using cwd as root");
                cwd.to_path_buf()
            }
        },
        Err(err) => {
            tracing::debug!(path = %cwd.display(), error = %err, "no git repository found, using cwd as root");
            cwd.to_path_buf()
        }
    }
}

/// URL of the default remote: `origin`, or the only configured remote.
pub fn default_remote_url(repo_root: &Path) -> Result<String, TrustError> {
    let repo = Repository::open(repo_root).map_err(|err| {
        TrustError::Inference(format!(
            "Unable to open git repository at {}: {}. Please specify --provider and --repo manually.",
            repo_root.display(),
            err.message()
        ))
    })?;

    let name = match repo.find_remote(DEFAULT_REMOTE) {
        Ok(_) => DEFAULT_REMOTE.to_string(),
        Err(_) => single_remote_name(&repo)?,
    };

    let remote = repo.find_remote(&name).map_err(|err| {
        TrustError::Inference(format!("Unable to read git remote '{}': {}", name, err.message()))
    })?;

    remote
        .url()
        .map(|u| u.trim().to_string())
        .ok_or_else(|| {
            TrustError::Inference(format!("Git remote '{}' has no valid UTF-8 URL", name))
        })
}

fn single_remote_name(repo: &Repository) -> Result<String, TrustError> {
    let remotes = repo
        .remotes()
        .map_err(|err| TrustError::Inference(format!("Unable to list git remotes: {}", err.message())))?;
    let names: Vec<&str> = remotes.iter().flatten().collect();

    match names.as_slice() {
        [only] => {
            tracing::debug!(remote = %only, "no 'origin' remote, using the only configured remote");
            Ok((*only).to_string())
        }
        [] => Err(TrustError::Inference(
            "No git remote configured. Please specify --provider and --repo manually.".to_string(),
        )),
        _ => Err(TrustError::Inference(format!(
            "No 'origin' remote and multiple remotes configured ({}). Please specify --repo manually.",
            names.join(", ")
        ))),
    }
}
