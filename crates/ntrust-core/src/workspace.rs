//! Package discovery.
//!
//! Resolves the publishable package names a batch should operate on, either
//! from explicit globs or from the workspace layout in `dir`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use glob::glob;
use serde::Deserialize;

const MANIFEST: &str = "package.json";
const PNPM_WORKSPACE: &str = "pnpm-workspace.yaml";

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    workspaces: Option<Workspaces>,
}

/// `workspaces` is either a list of globs or `{ packages: [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Workspaces {
    List(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl Workspaces {
    fn into_patterns(self) -> Vec<String> {
        match self {
            Workspaces::List(patterns) => patterns,
            Workspaces::Object { packages } => packages,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PnpmWorkspace {
    #[serde(default)]
    packages: Vec<String>,
}

/// Names of publishable packages under `dir`.
///
/// With `patterns` each entry is a glob relative to `dir`. Without, the
/// workspace definition is used together with the root manifest. Private or
/// unnamed manifests are skipped; if that leaves nothing, the error lists them.
pub fn find_packages(dir: &Path, patterns: &[String]) -> anyhow::Result<Vec<String>> {
    let manifests = if patterns.is_empty() {
        workspace_manifests(dir)?
    } else {
        expand(dir, patterns)?
    };

    let mut seen = HashSet::new();
    let mut names = Vec::new();
    let mut filtered = Vec::new();
    for path in manifests {
        let manifest = read_manifest(&path)?;
        if manifest.private {
            tracing::debug!(path = %path.display(), "skipping private package");
            filtered.push((path, "private=true"));
            continue;
        }
        let Some(name) = manifest.name.filter(|n| !n.trim().is_empty()) else {
            tracing::debug!(path = %path.display(), "skipping manifest without name");
            filtered.push((path, "missing name"));
            continue;
        };
        if seen.insert(name.clone()) {
            names.push(name);
        }
    }

    if names.is_empty() && !filtered.is_empty() {
        let listing: Vec<String> = filtered
            .iter()
            .map(|(path, reason)| format!("- {} ({})", path.display(), reason))
            .collect();
        anyhow::bail!(
            "No publishable package found.\nFiltered package.json files:\n{}",
            listing.join("\n")
        );
    }

    Ok(names)
}

fn workspace_manifests(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let root = dir.join(MANIFEST);
    let pnpm = dir.join(PNPM_WORKSPACE);

    let patterns = if pnpm.is_file() {
        let content = std::fs::read_to_string(&pnpm)
            .with_context(|| format!("Failed to read {}", pnpm.display()))?;
        let workspace: Option<PnpmWorkspace> = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", pnpm.display()))?;
        workspace.unwrap_or_default().packages
    } else if root.is_file() {
        read_manifest(&root)?
            .workspaces
            .map(Workspaces::into_patterns)
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    let mut manifests = Vec::new();
    if root.is_file() {
        manifests.push(root);
    }
    manifests.extend(expand(dir, &patterns)?);
    Ok(manifests)
}

/// Resolve globs to manifest paths; `!` entries exclude.
fn expand(dir: &Path, patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut excluded = HashSet::new();
    for pattern in patterns.iter().filter_map(|p| p.strip_prefix('!')) {
        excluded.extend(matches(dir, pattern)?);
    }

    let mut manifests = Vec::new();
    for pattern in patterns.iter().filter(|p| !p.starts_with('!')) {
        for entry in matches(dir, pattern)? {
            if excluded.contains(&entry) || is_in_node_modules(&entry) {
                continue;
            }
            let manifest = if entry.is_dir() {
                entry.join(MANIFEST)
            } else {
                entry
            };
            if manifest.is_file() && !manifests.contains(&manifest) {
                manifests.push(manifest);
            }
        }
    }
    Ok(manifests)
}

fn matches(dir: &Path, pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let pattern = pattern.trim().trim_start_matches("./").trim_end_matches('/');
    let full = dir.join(pattern);
    let mut entries: Vec<PathBuf> = glob(&full.to_string_lossy())
        .with_context(|| format!("Invalid package pattern: {}", pattern))?
        .flatten()
        .collect();
    entries.sort();
    Ok(entries)
}

fn is_in_node_modules(path: &Path) -> bool {
    path.components().any(|c| c.as_os_str() == "node_modules")
}

fn read_manifest(path: &Path) -> anyhow::Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn single_package_root() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", r#"{"name":"solo"}"#);

        assert_eq!(find_packages(temp.path(), &[]).unwrap(), vec!["solo"]);
    }

    #[test]
    fn pnpm_workspace_with_exclusion() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", r#"{"name":"root","private":true}"#);
        write(
            temp.path(),
            "pnpm-workspace.yaml",
            "packages:\n  - packages/*\n  - '!packages/internal'\n",
        );
        write(temp.path(), "packages/b/package.json", r#"{"name":"pkg-b"}"#);
        write(temp.path(), "packages/a/package.json", r#"{"name":"pkg-a"}"#);
        write(temp.path(), "packages/internal/package.json", r#"{"name":"internal"}"#);

        assert_eq!(
            find_packages(temp.path(), &[]).unwrap(),
            vec!["pkg-a", "pkg-b"]
        );
    }

    #[test]
    fn npm_workspaces_object_form() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "package.json",
            r#"{"name":"root","workspaces":{"packages":["libs/*"]}}"#,
        );
        write(temp.path(), "libs/x/package.json", r#"{"name":"x"}"#);
        write(temp.path(), "libs/y/package.json", r#"{"private":true,"name":"y"}"#);

        assert_eq!(find_packages(temp.path(), &[]).unwrap(), vec!["root", "x"]);
    }

    #[test]
    fn explicit_patterns_accept_dirs_and_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a/package.json", r#"{"name":"a"}"#);
        write(temp.path(), "b/package.json", r#"{"name":"b"}"#);
        write(temp.path(), "c/package.json", r#"{"version":"1.0.0"}"#);

        let patterns = vec![
            "a".to_string(),
            "b/package.json".to_string(),
            "c".to_string(),
            "./a/".to_string(),
        ];
        assert_eq!(find_packages(temp.path(), &patterns).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn empty_dir_has_no_packages() {
        let temp = TempDir::new().unwrap();
        assert!(find_packages(temp.path(), &[]).unwrap().is_empty());
    }

    #[test]
    fn all_filtered_lists_skipped_manifests() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pnpm-workspace.yaml", "packages:\n  - packages/*\n");
        write(
            temp.path(),
            "packages/private-a/package.json",
            r#"{"name":"@scope/private-a","private":true}"#,
        );
        write(temp.path(), "packages/no-name/package.json", r#"{"version":"1.0.0"}"#);

        let err = find_packages(temp.path(), &[]).unwrap_err();
        let message = err.to_string().replace(&*temp.path().to_string_lossy(), "<ROOT>");
        assert_eq!(
            message,
            "No publishable package found.\n\
             Filtered package.json files:\n\
             - <ROOT>/packages/no-name/package.json (missing name)\n\
             - <ROOT>/packages/private-a/package.json (private=true)"
        );
    }

    #[test]
    fn broken_manifest_is_an_error() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", "{ not json");

        let err = find_packages(temp.path(), &[]).unwrap_err();
        assert!(err.to_string().contains("package.json"));
    }
}
