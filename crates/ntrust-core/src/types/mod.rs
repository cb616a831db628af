//! Shared core types used across inference, reconciliation and configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Configuration scope levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigScope {
    /// User-wide configuration.
    Global,
    /// Per-project configuration (e.g., checked into version control).
    Project,
}

/// CI/CD provider a trusted publisher binding points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    GitHub,
    GitLab,
}

impl Provider {
    /// Subcommand of `npm trust` that creates a binding for this provider.
    pub fn trust_subcommand(self) -> &'static str {
        match self {
            Provider::GitHub => "github",
            Provider::GitLab => "gitlab",
        }
    }

    /// Flag `npm trust` uses to name the repository for this provider.
    pub fn repository_flag(self) -> &'static str {
        match self {
            Provider::GitHub => "--repo",
            Provider::GitLab => "--project",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::GitHub => "GitHub",
            Provider::GitLab => "GitLab",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.trust_subcommand())
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "github" => Ok(Provider::GitHub),
            "gitlab" => Ok(Provider::GitLab),
            _ => anyhow::bail!("Unknown provider: {}. Use 'github' or 'gitlab'", s),
        }
    }
}

/// The binding every package should end up with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredBinding {
    pub provider: Provider,
    /// Normalized `owner/name` identity
    pub repository: String,
    /// File name relative to the pipeline-definitions directory
    pub pipeline_file: String,
}

impl DesiredBinding {
    pub fn new(
        provider: Provider,
        repository: impl Into<String>,
        pipeline_file: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            repository: repository.into(),
            pipeline_file: pipeline_file.into(),
        }
    }

    /// Exact, case-sensitive comparison on `(repository, pipeline_file)`.
    ///
    /// The binding kind and any environment claim are not compared.
    pub fn matches(&self, existing: &ExistingBinding) -> bool {
        self.repository == existing.repository && self.pipeline_file == existing.pipeline_file
    }
}

impl fmt::Display for DesiredBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.provider.display_name(),
            self.repository,
            self.pipeline_file
        )
    }
}

/// A binding the registry currently holds for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingBinding {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "file", default)]
    pub pipeline_file: String,
    #[serde(alias = "project", default)]
    pub repository: String,
}

/// Kind of registry invocation an [`OperationRecord`] stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustAction {
    Query,
    Revoke,
    Create,
}

impl fmt::Display for TrustAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrustAction::Query => "query",
            TrustAction::Revoke => "revoke",
            TrustAction::Create => "create",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationStatus {
    Success,
    DryRun,
}

/// One registry invocation, issued or simulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub package: String,
    pub action: TrustAction,
    pub command: Vec<String>,
    pub status: OperationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Bindings reported by a query, in registry order
    #[serde(rename = "json", default, skip_serializing_if = "Vec::is_empty")]
    pub existing: Vec<ExistingBinding>,
}

impl OperationRecord {
    pub fn success(
        package: impl Into<String>,
        action: TrustAction,
        command: Vec<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            action,
            command,
            status: OperationStatus::Success,
            output: Some(output.into()),
            existing: Vec::new(),
        }
    }

    pub fn dry_run(package: impl Into<String>, action: TrustAction, command: Vec<String>) -> Self {
        Self {
            package: package.into(),
            action,
            command,
            status: OperationStatus::DryRun,
            output: None,
            existing: Vec::new(),
        }
    }

    pub fn with_existing(mut self, existing: Vec<ExistingBinding>) -> Self {
        self.existing = existing;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.status == OperationStatus::DryRun
    }
}
