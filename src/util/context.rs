//! Global context for wharf operations.
//!
//! Provides centralized access to the working directory and configuration.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::pyproject::PYPROJECT_NAME;
use crate::util::config::{global_config_path, load_config, project_config_path, Config};
use crate::util::diagnostic::suggestions;

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext { cwd }
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Find `pyproject.toml`, starting from cwd and searching upward.
    pub fn find_project(&self) -> Result<PathBuf> {
        let mut current = self.cwd.clone();
        loop {
            let candidate = current.join(PYPROJECT_NAME);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if !current.pop() {
                bail!(
                    "could not find `{}` in {} or any parent directory\nhelp: {}",
                    PYPROJECT_NAME,
                    self.cwd.display(),
                    suggestions::NO_PROJECT
                );
            }
        }
    }

    /// Merged global and project configuration for the project at `project_root`.
    pub fn config(&self, project_root: &Path) -> Config {
        let global = global_config_path();
        load_config(global.as_deref(), &project_config_path(project_root))
    }
}
