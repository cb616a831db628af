//! `npm` process runner.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::runtime::Runtime;

use super::{DEFAULT_TIMEOUT_SECS, MIN_NPM_VERSION, OutputMode, RegistryClient, RegistryOutput};
use crate::error::RegistryError;

/// Runs `npm` (or `mise exec npm@^11.10.0 -- npm`) as a child process.
#[derive(Debug)]
pub struct NpmCli {
    cwd: Option<PathBuf>,
    mise: bool,
    stdout_to_stderr: bool,
    timeout: Duration,
    runtime: Runtime,
}

impl NpmCli {
    /// Create a runner using the process cwd, plain `npm`, and the default timeout.
    pub fn new() -> Result<Self, RegistryError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(RegistryError::Runtime)?;

        Ok(Self {
            cwd: None,
            mise: false,
            stdout_to_stderr: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            runtime,
        })
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Run npm through `mise exec` so the required version is used.
    pub fn with_mise(mut self, mise: bool) -> Self {
        self.mise = mise;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wire the child's stdout to our stderr in [`OutputMode::Inherited`].
    pub fn with_stdout_to_stderr(mut self, enabled: bool) -> Self {
        self.stdout_to_stderr = enabled;
        self
    }

    fn redirects_stdout(&self, mode: OutputMode) -> bool {
        self.stdout_to_stderr && mode == OutputMode::Inherited
    }

    async fn execute(
        &self,
        command: &[String],
        mode: OutputMode,
    ) -> Result<RegistryOutput, RegistryError> {
        let display = command.join(" ");
        let (program, rest) = command
            .split_first()
            .ok_or_else(|| RegistryError::CommandFailed {
                command: display.clone(),
                exit_code: None,
                message: "Empty command".to_string(),
            })?;

        let mut cmd = Command::new(program);
        cmd.args(rest).arg("--loglevel=error").kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        match mode {
            OutputMode::Piped => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
            }
            OutputMode::Inherited if self.redirects_stdout(mode) => {
                cmd.stdin(Stdio::inherit())
                    .stdout(std::io::stderr())
                    .stderr(Stdio::inherit());
            }
            OutputMode::Inherited => {
                cmd.stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            }
        }

        let child = cmd.spawn().map_err(|source| RegistryError::Spawn {
            command: display.clone(),
            source,
        })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RegistryError::Timeout {
                command: display.clone(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|source| RegistryError::Spawn {
                command: display.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            let message = [stderr.trim(), stdout.trim()]
                .into_iter()
                .find(|s| !s.is_empty())
                .unwrap_or("Unknown npm error")
                .to_string();
            return Err(RegistryError::CommandFailed {
                command: display,
                exit_code: output.status.code(),
                message,
            });
        }

        Ok(RegistryOutput {
            command: command.to_vec(),
            stdout,
            stderr,
            exit_code: output.status.code().unwrap_or(0),
        })
    }
}

impl RegistryClient for NpmCli {
    fn command_line(&self, args: &[String]) -> Vec<String> {
        let mut tokens = if self.mise {
            vec![
                "mise".to_string(),
                "exec".to_string(),
                format!("npm@^{}", MIN_NPM_VERSION),
                "--".to_string(),
                "npm".to_string(),
            ]
        } else {
            vec!["npm".to_string()]
        };
        tokens.extend(args.iter().cloned());
        tokens
    }

    fn run(&self, args: &[String], mode: OutputMode) -> Result<RegistryOutput, RegistryError> {
        let command = self.command_line(args);
        tracing::debug!(command = %command.join(" "), ?mode, "running npm");
        self.runtime.block_on(self.execute(&command, mode))
    }

    fn check_version(&self) -> Result<semver::Version, RegistryError> {
        let output = self.run(&["--version".to_string()], OutputMode::Piped)?;
        let found = parse_npm_version(&output.stdout)?;
        if found < MIN_NPM_VERSION {
            return Err(RegistryError::VersionBelowMinimum {
                required: MIN_NPM_VERSION,
                found,
            });
        }
        Ok(found)
    }
}

/// Parse the leading `major.minor.patch` of `npm --version` output.
pub fn parse_npm_version(raw: &str) -> Result<semver::Version, RegistryError> {
    let trimmed = raw.trim();
    let core: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    semver::Version::parse(core.trim_end_matches('.'))
        .map_err(|_| RegistryError::InvalidVersion(trimmed.to_string()))
}

/// Whether the `npm` found on `PATH` is installed by mise.
pub fn npm_managed_by_mise() -> bool {
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path)
        .map(|dir| dir.join("npm"))
        .find(|candidate| candidate.is_file())
        .map(|npm| npm.to_string_lossy().contains("/mise/"))
        .unwrap_or(false)
}
