//! Structured progress events emitted by the engine.

use crate::types::{ExistingBinding, OperationRecord, TrustAction};

/// Something the engine did or is about to do.
#[derive(Debug, Clone, Copy)]
pub enum TrustEvent<'e> {
    VersionChecked {
        version: &'e semver::Version,
    },
    /// A batch is about to be confirmed; `bypassed` when `--yes` or dry-run skip the prompt.
    Confirming {
        prompt: &'e str,
        bypassed: bool,
    },
    Invoking {
        package: &'e str,
        action: TrustAction,
        command: &'e [String],
    },
    Queried {
        package: &'e str,
        existing: &'e [ExistingBinding],
    },
    Skipped {
        package: &'e str,
        existing: &'e ExistingBinding,
    },
    /// A query failed and is retried with the terminal attached.
    Retrying {
        package: &'e str,
        reason: &'e str,
    },
    Recorded {
        record: &'e OperationRecord,
    },
}

/// Receives engine events; presentation lives behind this trait.
pub trait TrustObserver {
    fn on_event(&self, event: &TrustEvent<'_>);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl TrustObserver for NoopObserver {
    fn on_event(&self, _event: &TrustEvent<'_>) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TrustObserver for TracingObserver {
    fn on_event(&self, event: &TrustEvent<'_>) {
        match event {
            TrustEvent::VersionChecked { version } => {
                tracing::debug!(%version, "npm version accepted");
            }
            TrustEvent::Confirming { prompt, bypassed } => {
                tracing::info!(%prompt, bypassed, "confirming batch");
            }
            TrustEvent::Invoking {
                package,
                action,
                command,
            } => {
                tracing::debug!(package, %action, command = %command.join(" "), "invoking npm");
            }
            TrustEvent::Queried { package, existing } => {
                if existing.is_empty() {
                    tracing::info!(package, "no trusted relationship");
                }
                for binding in existing.iter() {
                    tracing::info!(
                        package,
                        id = %binding.id,
                        repository = %binding.repository,
                        file = %binding.pipeline_file,
                        "found trusted relationship"
                    );
                }
            }
            TrustEvent::Skipped { package, existing } => {
                tracing::info!(package, id = %existing.id, "relationship already up to date");
            }
            TrustEvent::Retrying { package, reason } => {
                tracing::warn!(package, %reason, "trust list failed, retrying interactively");
            }
            TrustEvent::Recorded { record } => {
                tracing::info!(
                    package = %record.package,
                    action = %record.action,
                    dry_run = record.is_dry_run(),
                    "recorded operation"
                );
            }
        }
    }
}
