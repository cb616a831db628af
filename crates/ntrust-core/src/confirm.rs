//! Confirmation gate for destructive batch actions.

use crate::error::TrustError;

/// Terminal capability used by the gate.
pub trait Prompter {
    /// Whether a human can answer (stdin is a terminal).
    fn is_interactive(&self) -> bool;

    /// Show `prompt` and return the raw answer.
    fn ask(&self, prompt: &str) -> anyhow::Result<String>;
}

/// When the gate is bypassed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfirmPolicy {
    /// Auto-accept every prompt
    pub yes: bool,
    /// Nothing will be mutated
    pub dry_run: bool,
}

impl ConfirmPolicy {
    pub fn bypassed(&self) -> bool {
        self.yes || self.dry_run
    }
}

/// Ask for approval of a batch action.
pub fn confirm(prompter: &dyn Prompter, prompt: &str, policy: ConfirmPolicy) -> Result<(), TrustError> {
    if policy.bypassed() {
        return Ok(());
    }

    if !prompter.is_interactive() {
        return Err(TrustError::NonInteractive);
    }

    let answer = prompter
        .ask(&format!("{} [Y/n]", prompt))
        .map_err(|e| TrustError::Prompt(e.to_string()))?;

    if is_affirmative(&answer) {
        Ok(())
    } else {
        Err(TrustError::Cancelled)
    }
}

/// Empty, `y` or `yes` (any case) approves.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
}

/// Prompter for contexts without a terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn is_interactive(&self) -> bool {
        false
    }

    fn ask(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("No terminal attached")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Scripted {
        interactive: bool,
        answer: &'static str,
        asked: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(interactive: bool, answer: &'static str) -> Self {
            Self {
                interactive,
                answer,
                asked: RefCell::new(Vec::new()),
            }
        }
    }

    impl Prompter for Scripted {
        fn is_interactive(&self) -> bool {
            self.interactive
        }

        fn ask(&self, prompt: &str) -> anyhow::Result<String> {
            self.asked.borrow_mut().push(prompt.to_string());
            Ok(self.answer.to_string())
        }
    }

    #[test]
    fn yes_and_dry_run_bypass_prompt() {
        let prompter = Scripted::new(false, "n");
        for policy in [
            ConfirmPolicy {
                yes: true,
                dry_run: false,
            },
            ConfirmPolicy {
                yes: false,
                dry_run: true,
            },
        ] {
            confirm(&prompter, "Proceed?", policy).unwrap();
        }
        assert!(prompter.asked.borrow().is_empty());
    }

    #[test]
    fn non_interactive_is_a_hard_stop() {
        let err = confirm(&NonInteractive, "Proceed?", ConfirmPolicy::default()).unwrap_err();
        assert!(matches!(err, TrustError::NonInteractive));
    }

    #[test]
    fn accepted_answers() {
        for answer in ["", "  ", "y", "Y", "yes", "YES", " Yes "] {
            assert!(is_affirmative(answer), "{answer:?} should approve");
        }
    }

    #[test]
    fn other_answers_cancel() {
        let prompter = Scripted::new(true, "nope");
        let err = confirm(&prompter, "Proceed?", ConfirmPolicy::default()).unwrap_err();
        assert!(matches!(err, TrustError::Cancelled));
        assert_eq!(prompter.asked.borrow().as_slice(), ["Proceed? [Y/n]"]);
    }
}
