#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use git2::Repository;

use ntrust_core::confirm::Prompter;
use ntrust_core::error::RegistryError;
use ntrust_core::registry::{MIN_NPM_VERSION, OutputMode, RegistryClient, RegistryOutput};

/// Registry client replaying queued results and recording every call.
pub struct ScriptedRegistry {
    version: semver::Version,
    responses: RefCell<VecDeque<Result<String, RegistryError>>>,
    calls: RefCell<Vec<(Vec<String>, OutputMode)>>,
}

impl ScriptedRegistry {
    pub fn new() -> Self {
        Self::with_version(MIN_NPM_VERSION)
    }

    pub fn with_version(version: semver::Version) -> Self {
        Self {
            version,
            responses: RefCell::new(VecDeque::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Queue a successful invocation printing `stdout`.
    pub fn ok(self, stdout: &str) -> Self {
        self.responses.borrow_mut().push_back(Ok(stdout.to_string()));
        self
    }

    /// Queue a failed invocation.
    pub fn fail(self, message: &str) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Err(RegistryError::CommandFailed {
                command: "npm".to_string(),
                exit_code: Some(1),
                message: message.to_string(),
            }));
        self
    }

    pub fn calls(&self) -> Vec<(Vec<String>, OutputMode)> {
        self.calls.borrow().clone()
    }

    /// Just the args of each call, joined by spaces.
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|(args, _)| args.join(" "))
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl RegistryClient for ScriptedRegistry {
    fn command_line(&self, args: &[String]) -> Vec<String> {
        let mut line = vec!["npm".to_string()];
        line.extend(args.iter().cloned());
        line
    }

    fn run(&self, args: &[String], mode: OutputMode) -> Result<RegistryOutput, RegistryError> {
        self.calls.borrow_mut().push((args.to_vec(), mode));
        let next = self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected npm call: {}", args.join(" ")));
        next.map(|stdout| RegistryOutput {
            command: self.command_line(args),
            stdout,
            stderr: String::new(),
            exit_code: 0,
        })
    }

    fn check_version(&self) -> Result<semver::Version, RegistryError> {
        if self.version < MIN_NPM_VERSION {
            return Err(RegistryError::VersionBelowMinimum {
                required: MIN_NPM_VERSION,
                found: self.version.clone(),
            });
        }
        Ok(self.version.clone())
    }
}

/// Prompter answering from a fixed list.
pub struct ScriptedPrompter {
    interactive: bool,
    answers: RefCell<VecDeque<String>>,
    pub asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn answering(answers: &[&str]) -> Self {
        Self {
            interactive: true,
            answers: RefCell::new(answers.iter().map(|a| a.to_string()).collect()),
            asked: RefCell::new(Vec::new()),
        }
    }

    pub fn detached() -> Self {
        Self {
            interactive: false,
            answers: RefCell::new(VecDeque::new()),
            asked: RefCell::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn ask(&self, prompt: &str) -> anyhow::Result<String> {
        self.asked.borrow_mut().push(prompt.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted answer for {prompt}"))
    }
}

pub fn binding_json(id: &str, repository: &str, file: &str) -> String {
    format!(r#"{{"id":"{id}","type":"github","file":"{file}","repository":"{repository}"}}"#)
}

pub fn packages(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Fresh repository with an `origin` remote.
pub fn init_repo(root: &Path, origin: &str) -> Repository {
    let repo = Repository::init(root).unwrap();
    repo.remote("origin", origin).unwrap();
    repo
}

pub fn write_workflow(root: &Path, name: &str, content: &str) {
    let dir = root.join(".github/workflows");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), content).unwrap();
}
