//! Terminal side of the trust commands.
//!
//! [`TerminalPrompter`] answers the confirmation gate with dialoguer and
//! [`ConsoleObserver`] renders engine progress.

use std::cell::RefCell;
use std::io::{self, IsTerminal, Write};

use console::style;
use dialoguer::{Input, theme::ColorfulTheme};

use ntrust_core::confirm::Prompter;
use ntrust_core::reconcile::{TrustEvent, TrustObserver};
use ntrust_core::types::TrustAction;

/// Prompter reading answers from the controlling terminal.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn ask(&self, prompt: &str) -> anyhow::Result<String> {
        let answer = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(answer)
    }
}

/// Prints engine progress as it happens.
pub struct ConsoleObserver<W: Write = io::Stdout> {
    /// Output writer (for testing)
    writer: RefCell<W>,
}

impl ConsoleObserver<io::Stdout> {
    pub fn new() -> Self {
        Self {
            writer: RefCell::new(io::stdout()),
        }
    }
}

impl Default for ConsoleObserver<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleObserver<W> {
    #[cfg(test)]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: RefCell::new(writer),
        }
    }

    #[cfg(test)]
    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    fn render(&self, event: &TrustEvent<'_>) -> io::Result<()> {
        let mut out = self.writer.borrow_mut();
        match event {
            TrustEvent::VersionChecked { .. } | TrustEvent::Queried { .. } => {}
            TrustEvent::Confirming { prompt, bypassed } => {
                if *bypassed {
                    writeln!(out, "{} {}", style("?").yellow(), prompt)?;
                    writeln!(out, "  {}", style("(auto-confirmed)").dim())?;
                }
            }
            TrustEvent::Invoking {
                action, command, ..
            } => {
                if *action != TrustAction::Query {
                    writeln!(out, "  {}", style(format!("$ {}", command.join(" "))).dim())?;
                }
            }
            TrustEvent::Skipped { package, existing } => {
                writeln!(
                    out,
                    "{} {} already trusts {} ({})",
                    style("•").dim(),
                    style(package).bold(),
                    existing.repository,
                    existing.pipeline_file
                )?;
            }
            TrustEvent::Retrying { package, reason } => {
                writeln!(
                    out,
                    "{} Listing {} failed, retrying in the terminal:\n  {}",
                    style("⚠").yellow(),
                    style(package).bold(),
                    reason
                )?;
            }
            TrustEvent::Recorded { record } => {
                if record.is_dry_run() {
                    writeln!(
                        out,
                        "{} {}",
                        style("[dry-run]").cyan(),
                        record.command.join(" ")
                    )?;
                } else if record.action != TrustAction::Query {
                    let verb = match record.action {
                        TrustAction::Revoke => "Revoked",
                        _ => "Created",
                    };
                    writeln!(
                        out,
                        "{} {} trusted publisher for {}",
                        style("✓").green(),
                        verb,
                        style(&record.package).bold()
                    )?;
                }
            }
        }
        Ok(())
    }
}

impl<W: Write> TrustObserver for ConsoleObserver<W> {
    fn on_event(&self, event: &TrustEvent<'_>) {
        if let Err(e) = self.render(event) {
            tracing::debug!(error = %e, "failed to write progress");
        }
    }
}
