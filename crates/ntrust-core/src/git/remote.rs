//! Remote URL parsing into provider and repository identity.

use url::Url;

use crate::error::TrustError;
use crate::types::Provider;

/// Parse a git remote URL into a normalized `owner/name` identity.
///
/// Supports formats:
/// - `git@github.com:owner/name.git`
/// - `https://github.com/owner/name.git`
/// - `ssh://git@github.com/owner/name`
pub fn parse_repo_from_remote(remote: &str) -> Result<String, TrustError> {
    let remote = remote.trim();

    let path = if remote.contains("://") {
        url_path(remote)
    } else {
        scp_like_path(remote).map(str::to_string)
    };

    path.map(|p| normalize_repo_path(&p))
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            TrustError::Inference(format!(
                "Unable to parse repository from git remote: {}",
                remote
            ))
        })
}

/// Infer the CI provider from the remote host.
pub fn infer_provider_from_remote(remote: &str) -> Result<Provider, TrustError> {
    if remote.contains("github.com") {
        return Ok(Provider::GitHub);
    }
    if remote.contains("gitlab") {
        return Ok(Provider::GitLab);
    }
    Err(TrustError::Inference(format!(
        "Unable to infer provider from remote URL: {}. Please specify --provider manually.",
        remote
    )))
}

/// Check that a repository identity is exactly `owner/name`.
pub fn validate_repo_identity(repo: &str) -> Result<(), TrustError> {
    let segments: Vec<&str> = repo.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() != 2 {
        return Err(TrustError::Inference(format!(
            "Expected GitHub repository to be \"owner/name\", but got \"{}\".",
            repo
        )));
    }
    Ok(())
}

fn url_path(remote: &str) -> Option<String> {
    let url = Url::parse(remote).ok()?;
    url.host_str()?;
    let path = url.path().trim_start_matches('/');
    if path.is_empty() {
        return None;
    }
    Some(path.to_string())
}

/// `user@host:path` as understood by git for ssh remotes.
fn scp_like_path(remote: &str) -> Option<&str> {
    let (user, rest) = remote.split_once('@')?;
    if user.is_empty() {
        return None;
    }
    let (host, path) = rest.split_once(':')?;
    if host.is_empty() || path.is_empty() {
        return None;
    }
    Some(path)
}

fn normalize_repo_path(value: &str) -> String {
    let value = value.trim().trim_start_matches('/');
    value
        .strip_suffix(".git")
        .unwrap_or(value)
        .trim()
        .to_string()
}
