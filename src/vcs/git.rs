//! Git ignore lists via libgit2.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use git2::{ErrorCode, Repository, StatusOptions};

use crate::core::errors::BuildError;
use crate::vcs::VcsIgnoreProvider;

/// Reads ignored paths from the git repository enclosing the project.
///
/// A project outside any repository has nothing ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitIgnores;

impl VcsIgnoreProvider for GitIgnores {
    fn list_ignored(&self, root: &Path) -> Result<HashSet<PathBuf>, BuildError> {
        let vcs_error = |e: git2::Error| BuildError::Vcs {
            root: root.to_path_buf(),
            message: e.message().to_string(),
        };

        let repo = match Repository::discover(root) {
            Ok(repo) => repo,
            Err(e) if e.code() == ErrorCode::NotFound => {
                tracing::debug!("{} is not inside a git repository", root.display());
                return Ok(HashSet::new());
            }
            Err(e) => return Err(vcs_error(e)),
        };

        let Some(workdir) = repo.workdir() else {
            // Bare repositories have no working tree to ignore anything in.
            return Ok(HashSet::new());
        };

        // libgit2 reports paths against the canonical working directory.
        let canonical_root = root.canonicalize().map_err(|e| BuildError::io(root, e))?;
        let workdir = workdir.canonicalize().map_err(|e| BuildError::io(workdir, e))?;

        let mut opts = StatusOptions::new();
        opts.include_ignored(true)
            .recurse_ignored_dirs(true)
            .include_untracked(false);

        let statuses = repo.statuses(Some(&mut opts)).map_err(vcs_error)?;

        let ignored: HashSet<PathBuf> = statuses
            .iter()
            .filter(|entry| entry.status().is_ignored())
            .filter_map(|entry| entry.path().map(|p| workdir.join(p)))
            .filter_map(|path| {
                path.strip_prefix(&canonical_root)
                    .ok()
                    .map(|rel| root.join(rel))
            })
            .collect();

        tracing::debug!("git ignores {} path(s) under {}", ignored.len(), root.display());
        Ok(ignored)
    }
}
