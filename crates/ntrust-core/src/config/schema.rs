//! Schema of `ntrust.toml`.

use serde::{Deserialize, Serialize};

use crate::types::Provider;

/// Defaults for the trust commands.
///
/// Every field is optional; a missing value falls through to the next scope
/// and finally to inference or the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NtrustConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,

    /// Repository identity, `owner/name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Pipeline file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// CI environment claim for created bindings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,

    /// Run npm through `mise exec`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mise: Option<bool>,

    /// Per-invocation timeout for npm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl NtrustConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(registry) = &self.registry {
            let parsed = url::Url::parse(registry)
                .map_err(|e| anyhow::anyhow!("Invalid registry URL '{}': {}", registry, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!(
                    "Invalid registry URL '{}': expected an http or https URL",
                    registry
                );
            }
        }

        if let Some(repo) = &self.repo {
            crate::git::validate_repo_identity(repo)?;
        }

        if self.timeout_secs == Some(0) {
            anyhow::bail!("timeout_secs must be greater than zero");
        }

        Ok(())
    }

    /// Overlay `other` on top of `self`; set fields in `other` win.
    pub fn merge(mut self, other: NtrustConfig) -> Self {
        self.provider = other.provider.or(self.provider);
        self.repo = other.repo.or(self.repo);
        self.file = other.file.or(self.file);
        self.env = other.env.or(self.env);
        self.registry = other.registry.or(self.registry);
        self.mise = other.mise.or(self.mise);
        self.timeout_secs = other.timeout_secs.or(self.timeout_secs);
        self
    }
}
