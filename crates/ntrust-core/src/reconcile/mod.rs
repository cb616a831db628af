//! Trust relationship reconciliation.
//!
//! [`TrustEngine`] walks a package list strictly in order, one package at a
//! time, and converges each package's registry binding toward the desired
//! one:
//!
//! | existing bindings                  | decision           | invocations                  |
//! |------------------------------------|--------------------|------------------------------|
//! | none                               | `CreateOnly`       | query, create                |
//! | one matching `(repository, file)`  | `Skip`             | query, revoke each other one |
//! | none matching                      | `RevokeThenCreate` | query, revoke each, create   |
//!
//! The first failing invocation aborts the batch. Nothing is rolled back; the
//! [`BatchError`] carries the records produced so far.

mod observer;

pub use observer::{NoopObserver, TracingObserver, TrustEvent, TrustObserver};

use serde_json::Value;

use crate::confirm::{ConfirmPolicy, Prompter, confirm};
use crate::error::{BatchError, RegistryError, TrustError};
use crate::registry::trust::{create_args, list_args, revoke_args};
use crate::registry::{OutputMode, RegistryClient, RegistryOutput};
use crate::types::{DesiredBinding, ExistingBinding, OperationRecord, TrustAction};

/// Options shared by every batch operation.
#[derive(Debug, Clone, Default)]
pub struct TrustOptions {
    /// CI environment claim, passed to create only
    pub env: Option<String>,
    /// Registry URL, passed to every trust command
    pub registry: Option<String>,
    pub dry_run: bool,
    /// Auto-accept confirmation prompts
    pub yes: bool,
}

impl TrustOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn with_registry(mut self, registry: impl Into<String>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_yes(mut self, yes: bool) -> Self {
        self.yes = yes;
        self
    }

    fn confirm_policy(&self) -> ConfirmPolicy {
        ConfirmPolicy {
            yes: self.yes,
            dry_run: self.dry_run,
        }
    }
}

/// What to do with one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileDecision {
    /// `current` already matches; `stale` holds the other bindings to revoke.
    Skip {
        current: ExistingBinding,
        stale: Vec<ExistingBinding>,
    },
    CreateOnly,
    RevokeThenCreate { stale: Vec<ExistingBinding> },
}

/// Compare the registry's bindings with the desired one.
///
/// The first matching binding is kept.
pub fn decide(existing: Vec<ExistingBinding>, desired: &DesiredBinding) -> ReconcileDecision {
    if existing.is_empty() {
        return ReconcileDecision::CreateOnly;
    }

    match existing.iter().position(|binding| desired.matches(binding)) {
        Some(index) => {
            let mut stale = existing;
            let current = stale.remove(index);
            ReconcileDecision::Skip { current, stale }
        }
        None => ReconcileDecision::RevokeThenCreate { stale: existing },
    }
}

/// Parse `npm trust list --json <pkg>` output.
///
/// Empty output, `null`, `{}` and `[]` mean no binding. A single object is one
/// binding; an array lists all of them.
pub fn parse_existing(package: &str, stdout: &str) -> Result<Vec<ExistingBinding>, TrustError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let malformed = |source| TrustError::MalformedResponse {
        package: package.to_string(),
        source,
    };

    let value: Value = serde_json::from_str(trimmed).map_err(malformed)?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(ref map) if map.is_empty() => Ok(Vec::new()),
        Value::Array(_) => serde_json::from_value(value).map_err(malformed),
        other => serde_json::from_value(other)
            .map(|binding| vec![binding])
            .map_err(malformed),
    }
}

/// Runs trust batches against a registry client.
pub struct TrustEngine<'a> {
    client: &'a dyn RegistryClient,
    prompter: &'a dyn Prompter,
    observer: &'a dyn TrustObserver,
}

impl<'a> TrustEngine<'a> {
    pub fn new(client: &'a dyn RegistryClient, prompter: &'a dyn Prompter) -> Self {
        Self {
            client,
            prompter,
            observer: &NoopObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn TrustObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Converge every package onto `desired`.
    pub fn apply(
        &self,
        packages: &[String],
        desired: &DesiredBinding,
        options: &TrustOptions,
    ) -> Result<Vec<OperationRecord>, BatchError> {
        self.ensure_version()?;
        if packages.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = format!(
            "Create trusted publisher relationships for {} package(s) with {}?",
            packages.len(),
            desired
        );
        self.confirm(&prompt, options)
            .map_err(|source| BatchError::new(None, Vec::new(), source))?;

        self.for_each_package(packages, Vec::new(), |package, records| {
            self.apply_one(package, desired, options, records)
        })
    }

    /// Show each package's current binding.
    pub fn list(
        &self,
        packages: &[String],
        options: &TrustOptions,
    ) -> Result<Vec<OperationRecord>, BatchError> {
        self.ensure_version()?;

        self.for_each_package(packages, Vec::new(), |package, records| {
            let args = list_args(package, options.registry.as_deref());
            if options.dry_run {
                let record =
                    OperationRecord::dry_run(package, TrustAction::Query, self.client.command_line(&args));
                self.push(record, records);
                return Ok(());
            }

            let output = self.query_with_retry(package, &args)?;
            self.record_query(package, output, records)?;
            Ok(())
        })
    }

    /// Revoke every existing binding of the given packages.
    pub fn revoke_all(
        &self,
        packages: &[String],
        options: &TrustOptions,
    ) -> Result<Vec<OperationRecord>, BatchError> {
        self.ensure_version()?;

        let mut targets: Vec<(&str, ExistingBinding)> = Vec::new();
        let mut affected = 0;
        let mut records = self.for_each_package(packages, Vec::new(), |package, records| {
            let existing = self.query(package, options, records)?;
            if !existing.is_empty() {
                affected += 1;
            }
            targets.extend(existing.into_iter().map(|binding| (package, binding)));
            Ok(())
        })?;

        if targets.is_empty() {
            return Ok(records);
        }

        let prompt = format!(
            "Revoke {} trusted relationship(s) across {} package(s)?",
            targets.len(),
            affected
        );
        if let Err(source) = self.confirm(&prompt, options) {
            return Err(BatchError::new(None, records, source));
        }

        for (package, existing) in &targets {
            let args = revoke_args(&existing.id, package, options.registry.as_deref());
            if let Err(source) = self.mutate(package, TrustAction::Revoke, &args, options, &mut records)
            {
                return Err(BatchError::new(Some(*package), records, source));
            }
        }

        Ok(records)
    }

    fn apply_one(
        &self,
        package: &str,
        desired: &DesiredBinding,
        options: &TrustOptions,
        records: &mut Vec<OperationRecord>,
    ) -> Result<(), TrustError> {
        let existing = self.query(package, options, records)?;

        match decide(existing, desired) {
            ReconcileDecision::Skip { current, stale } => {
                self.observer.on_event(&TrustEvent::Skipped {
                    package,
                    existing: &current,
                });
                return self.revoke_each(package, &stale, options, records);
            }
            ReconcileDecision::RevokeThenCreate { stale } => {
                self.revoke_each(package, &stale, options, records)?;
            }
            ReconcileDecision::CreateOnly => {}
        }

        let args = create_args(
            package,
            desired,
            options.env.as_deref(),
            options.registry.as_deref(),
        );
        self.mutate(package, TrustAction::Create, &args, options, records)
    }

    fn revoke_each(
        &self,
        package: &str,
        bindings: &[ExistingBinding],
        options: &TrustOptions,
        records: &mut Vec<OperationRecord>,
    ) -> Result<(), TrustError> {
        for binding in bindings {
            let args = revoke_args(&binding.id, package, options.registry.as_deref());
            self.mutate(package, TrustAction::Revoke, &args, options, records)?;
        }
        Ok(())
    }

    /// Run `step` for each package in order, stopping at the first failure.
    fn for_each_package<'p, F>(
        &self,
        packages: &'p [String],
        mut records: Vec<OperationRecord>,
        mut step: F,
    ) -> Result<Vec<OperationRecord>, BatchError>
    where
        F: FnMut(&'p str, &mut Vec<OperationRecord>) -> Result<(), TrustError>,
    {
        for package in packages {
            if let Err(source) = step(package.as_str(), &mut records) {
                return Err(BatchError::new(Some(package.as_str()), records, source));
            }
        }
        Ok(records)
    }

    fn ensure_version(&self) -> Result<(), BatchError> {
        let version = self
            .client
            .check_version()
            .map_err(|e| BatchError::new(None, Vec::new(), e.into()))?;
        self.observer
            .on_event(&TrustEvent::VersionChecked { version: &version });
        Ok(())
    }

    fn confirm(&self, prompt: &str, options: &TrustOptions) -> Result<(), TrustError> {
        let policy = options.confirm_policy();
        self.observer.on_event(&TrustEvent::Confirming {
            prompt,
            bypassed: policy.bypassed(),
        });
        confirm(self.prompter, prompt, policy)
    }

    /// Live query of the package's binding; runs even in dry-run.
    fn query(
        &self,
        package: &str,
        options: &TrustOptions,
        records: &mut Vec<OperationRecord>,
    ) -> Result<Vec<ExistingBinding>, TrustError> {
        let args = list_args(package, options.registry.as_deref());
        self.observer.on_event(&TrustEvent::Invoking {
            package,
            action: TrustAction::Query,
            command: &self.client.command_line(&args),
        });
        let output = self.client.run(&args, OutputMode::Piped)?;
        self.record_query(package, output, records)
    }

    /// Query, and on a failed exit retry once attached to the terminal before
    /// a final captured query.
    fn query_with_retry(&self, package: &str, args: &[String]) -> Result<RegistryOutput, TrustError> {
        self.observer.on_event(&TrustEvent::Invoking {
            package,
            action: TrustAction::Query,
            command: &self.client.command_line(args),
        });

        match self.client.run(args, OutputMode::Piped) {
            Ok(output) => Ok(output),
            Err(RegistryError::CommandFailed { message, .. }) => {
                self.observer.on_event(&TrustEvent::Retrying {
                    package,
                    reason: &message,
                });
                if let Err(err) = self.client.run(args, OutputMode::Inherited) {
                    tracing::warn!(package, error = %err, "interactive trust list failed");
                }
                Ok(self.client.run(args, OutputMode::Piped)?)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn record_query(
        &self,
        package: &str,
        output: RegistryOutput,
        records: &mut Vec<OperationRecord>,
    ) -> Result<Vec<ExistingBinding>, TrustError> {
        let existing = parse_existing(package, &output.stdout)?;
        self.observer.on_event(&TrustEvent::Queried {
            package,
            existing: &existing,
        });
        tracing::debug!(package, count = existing.len(), "parsed trust list output");

        let record = OperationRecord::success(package, TrustAction::Query, output.command, output.stdout)
            .with_existing(existing.clone());
        self.push(record, records);

        Ok(existing)
    }

    /// Revoke or create; simulated under dry-run.
    fn mutate(
        &self,
        package: &str,
        action: TrustAction,
        args: &[String],
        options: &TrustOptions,
        records: &mut Vec<OperationRecord>,
    ) -> Result<(), TrustError> {
        let command = self.client.command_line(args);
        if options.dry_run {
            self.push(OperationRecord::dry_run(package, action, command), records);
            return Ok(());
        }

        self.observer.on_event(&TrustEvent::Invoking {
            package,
            action,
            command: &command,
        });
        let output = self.client.run(args, OutputMode::Inherited)?;
        self.push(
            OperationRecord::success(package, action, output.command, output.stdout),
            records,
        );
        Ok(())
    }

    fn push(&self, record: OperationRecord, records: &mut Vec<OperationRecord>) {
        self.observer.on_event(&TrustEvent::Recorded { record: &record });
        records.push(record);
    }
}
