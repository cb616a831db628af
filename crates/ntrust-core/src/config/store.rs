//! Config store for loading ntrust.toml.

use std::path::{Path, PathBuf};

use crate::types::ConfigScope;

use super::paths::config_path_for_scope;
use super::{NtrustConfig, parser};

/// One scope's `ntrust.toml`.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    pub fn from_paths(scope: ConfigScope, global_dir: &Path, project_root: &Path) -> Self {
        Self {
            config_path: config_path_for_scope(scope, global_dir, project_root),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> anyhow::Result<NtrustConfig> {
        if !self.config_path.exists() {
            return Ok(NtrustConfig::new());
        }
        parser::parse_ntrust_toml(&self.config_path)
    }
}

/// Global config overlaid with the project config found in `project_root`.
pub fn load_merged(global_dir: Option<&Path>, project_root: &Path) -> anyhow::Result<NtrustConfig> {
    let global = match global_dir {
        Some(dir) => ConfigStore::from_paths(ConfigScope::Global, dir, project_root).load()?,
        None => NtrustConfig::new(),
    };
    let store = ConfigStore::from_paths(ConfigScope::Project, Path::new(""), project_root);
    let project = store.load()?;

    tracing::debug!(path = %store.config_path().display(), "loaded ntrust config");
    Ok(global.merge(project))
}
