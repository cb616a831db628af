//! npm registry client adapter.
//!
//! The reconciliation engine only talks to the registry through
//! [`RegistryClient`]. [`NpmCli`] is the production implementation that
//! spawns the `npm` binary (optionally through `mise`).

mod npm;
pub mod trust;

pub use npm::{NpmCli, npm_managed_by_mise, parse_npm_version};

use crate::error::RegistryError;

/// Minimum npm version that ships `npm trust`.
pub const MIN_NPM_VERSION: semver::Version = semver::Version::new(11, 10, 0);

/// Default upper bound for a single npm invocation, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// How the child's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Captured; the caller sees stdout/stderr
    #[default]
    Piped,
    /// Passed through to the terminal, so npm can prompt (e.g., one-time passwords)
    Inherited,
}

/// Structured result of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistryOutput {
    pub command: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Capability to run registry subcommands.
pub trait RegistryClient {
    /// Full command line that `run` would execute for `args`.
    fn command_line(&self, args: &[String]) -> Vec<String>;

    /// Run `npm <args>`; a non-zero exit is a [`RegistryError::CommandFailed`].
    fn run(&self, args: &[String], mode: OutputMode) -> Result<RegistryOutput, RegistryError>;

    /// Return the client version, failing if it is below [`MIN_NPM_VERSION`].
    fn check_version(&self) -> Result<semver::Version, RegistryError>;
}
