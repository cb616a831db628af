//! GitHub Actions workflow scanner.

use std::path::{Path, PathBuf};

use serde_yaml_ng::Value;

use super::{PublishStep, PublishStepScanner, is_direct_publish_command, split_run_command};
use crate::error::TrustError;

/// Workflow directory relative to the repository root.
pub const WORKFLOW_DIR: &str = ".github/workflows";

/// Scans `.github/workflows/*.yml` for `run:` steps that publish packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHubWorkflows;

impl PublishStepScanner for GitHubWorkflows {
    fn label(&self) -> &'static str {
        "GitHub actions"
    }

    fn scan(&self, repo_root: &Path) -> Result<Vec<PublishStep>, TrustError> {
        let workflow_dir = repo_root.join(WORKFLOW_DIR);
        let files = list_workflow_files(&workflow_dir)?;

        let mut matches = Vec::new();
        for (name, path) in files {
            let content = std::fs::read_to_string(&path).map_err(|e| TrustError::InvalidPipeline {
                path: path.clone(),
                message: e.to_string(),
            })?;
            let workflow: Value =
                serde_yaml_ng::from_str(&content).map_err(|e| TrustError::InvalidPipeline {
                    path: path.clone(),
                    message: e.to_string(),
                })?;

            matches.extend(publish_steps_in(&name, &workflow));
        }

        tracing::debug!(
            dir = %workflow_dir.display(),
            count = matches.len(),
            "scanned workflows for publish commands"
        );
        Ok(matches)
    }
}

fn list_workflow_files(workflow_dir: &Path) -> Result<Vec<(String, PathBuf)>, TrustError> {
    let entries = std::fs::read_dir(workflow_dir).map_err(|_| {
        TrustError::Inference(format!(
            "Cannot find workflow directory \"{}\". Please specify --file manually.",
            workflow_dir.display()
        ))
    })?;

    let mut files: Vec<(String, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            (name.ends_with(".yml") || name.ends_with(".yaml")).then(|| (name, entry.path()))
        })
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(files)
}

/// Walk `jobs.<name>.steps[i].run` and collect direct publish commands.
fn publish_steps_in(file: &str, workflow: &Value) -> Vec<PublishStep> {
    let Some(jobs) = workflow.get("jobs").and_then(Value::as_mapping) else {
        return Vec::new();
    };

    let mut matches = Vec::new();
    for (job_name, job) in jobs {
        let Some(steps) = job.get("steps").and_then(Value::as_sequence) else {
            continue;
        };

        for (index, step) in steps.iter().enumerate() {
            let Some(run) = step.get("run").and_then(Value::as_str) else {
                continue;
            };

            for command in split_run_command(run) {
                if is_direct_publish_command(&command) {
                    matches.push(PublishStep {
                        file: file.to_string(),
                        job: job_label(job_name),
                        step: index + 1,
                        command,
                    });
                }
            }
        }
    }
    matches
}

/// Render a job key; YAML allows numbers and other scalars there.
fn job_label(key: &Value) -> String {
    match key {
        Value::String(name) => name.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => serde_yaml_ng::to_string(other)
            .map(|rendered| rendered.trim().to_string())
            .unwrap_or_else(|_| format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_workflow(root: &Path, name: &str, content: &str) {
        let dir = root.join(WORKFLOW_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn finds_publish_step_with_job_and_index() {
        let temp = TempDir::new().unwrap();
        write_workflow(
            temp.path(),
            "release.yml",
            r#"
name: Release
on:
  push:
    tags: ["v*"]
jobs:
  release:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - run: pnpm install
      - name: Publish
        run: |
          pnpm build
          pnpm -r publish --provenance --no-git-checks
"#,
        );

        let matches = GitHubWorkflows.scan(temp.path()).unwrap();
        assert_eq!(
            matches,
            vec![PublishStep {
                file: "release.yml".to_string(),
                job: "release".to_string(),
                step: 3,
                command: "pnpm -r publish --provenance --no-git-checks".to_string(),
            }]
        );
    }

    #[test]
    fn reports_every_match_in_file_order() {
        let temp = TempDir::new().unwrap();
        write_workflow(
            temp.path(),
            "b.yaml",
            "jobs:\n  two:\n    steps:\n      - run: yarn publish\n",
        );
        write_workflow(
            temp.path(),
            "a.yml",
            "jobs:\n  one:\n    steps:\n      - run: npm ci && npm publish\n",
        );

        let matches = GitHubWorkflows.scan(temp.path()).unwrap();
        let rendered: Vec<String> = matches.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "a.yml (job=one, step=1): npm publish",
                "b.yaml (job=two, step=1): yarn publish",
            ]
        );
    }

    #[test]
    fn ignores_non_workflow_files_and_malformed_jobs() {
        let temp = TempDir::new().unwrap();
        write_workflow(temp.path(), "README.md", "npm publish");
        write_workflow(temp.path(), "weird.yml", "jobs: []\n");
        write_workflow(
            temp.path(),
            "uses.yml",
            "jobs:\n  ci:\n    steps:\n      - uses: actions/setup-node@v4\n      - run: 42\n",
        );

        let matches = GitHubWorkflows.scan(temp.path()).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn non_string_job_keys_are_scanned() {
        let temp = TempDir::new().unwrap();
        write_workflow(
            temp.path(),
            "release.yml",
            "jobs:\n  1:\n    steps:\n      - run: npm publish\n  true:\n    steps:\n      - run: pnpm publish\n",
        );

        let matches = GitHubWorkflows.scan(temp.path()).unwrap();
        let jobs: Vec<&str> = matches.iter().map(|m| m.job.as_str()).collect();
        assert_eq!(jobs, vec!["1", "true"]);
    }

    #[test]
    fn missing_directory_asks_for_manual_file() {
        let temp = TempDir::new().unwrap();
        let err = GitHubWorkflows.scan(temp.path()).unwrap_err();
        assert!(err.to_string().contains("Cannot find workflow directory"));
        assert!(err.to_string().contains("Please specify --file manually."));
    }

    #[test]
    fn invalid_yaml_is_reported_with_path() {
        let temp = TempDir::new().unwrap();
        write_workflow(temp.path(), "broken.yml", "jobs: [unclosed\n");

        let err = GitHubWorkflows.scan(temp.path()).unwrap_err();
        match err {
            TrustError::InvalidPipeline { path, .. } => {
                assert!(path.ends_with("broken.yml"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
