//! Version control ignore lists.
//!
//! The build core only ever asks one question of version control: which
//! paths under the project root are currently ignored. Providers answer it
//! with absolute paths; an empty set means nothing is ignored.

pub mod git;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::errors::BuildError;

pub use git::GitIgnores;

/// Source of the paths version control currently ignores.
pub trait VcsIgnoreProvider {
    /// Absolute paths under `root` that are ignored.
    ///
    /// Must not modify repository state.
    fn list_ignored(&self, root: &Path) -> Result<HashSet<PathBuf>, BuildError>;
}

/// Provider for projects that are not under version control, or when
/// ignore lists are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVcs;

impl VcsIgnoreProvider for NoVcs {
    fn list_ignored(&self, _root: &Path) -> Result<HashSet<PathBuf>, BuildError> {
        Ok(HashSet::new())
    }
}

/// Provider reporting a fixed set of paths, given relative to the project root.
#[derive(Debug, Default, Clone)]
pub struct StaticIgnores {
    ignored: Vec<PathBuf>,
}

impl StaticIgnores {
    pub fn new<P: AsRef<Path>>(ignored: impl IntoIterator<Item = P>) -> Self {
        StaticIgnores {
            ignored: ignored.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
        }
    }
}

impl VcsIgnoreProvider for StaticIgnores {
    fn list_ignored(&self, root: &Path) -> Result<HashSet<PathBuf>, BuildError> {
        Ok(self.ignored.iter().map(|rel| root.join(rel)).collect())
    }
}

/// Pick the ignore provider for a build.
pub fn provider(respect_vcs_ignores: bool) -> Box<dyn VcsIgnoreProvider> {
    if respect_vcs_ignores {
        Box::new(GitIgnores)
    } else {
        tracing::debug!("version control ignore lists disabled");
        Box::new(NoVcs)
    }
}
