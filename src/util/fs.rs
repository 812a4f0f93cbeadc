//! Filesystem utilities.

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::core::errors::BuildError;

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a relative path with `/` separators, as used inside archives.
///
/// Returns `None` for paths that climb out of their base or are absolute.
pub fn to_archive_path(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(parts.join("/"))
}

/// Every file below `dir`, in a stable (sorted by name) order.
///
/// Directories for which `skip_dir` returns true are not descended into.
/// Symlinked files are kept; symlinked directories are not followed.
pub fn walk_files(dir: &Path, skip_dir: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>, BuildError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && e.depth() > 0 && skip_dir(e.path())));

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        if entry.path().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn walk_error(dir: &Path, err: walkdir::Error) -> BuildError {
    let path = err.path().unwrap_or(dir).to_path_buf();
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other(message));
    BuildError::io(path, source)
}

/// Escape `base` so it can prefix a glob pattern literally.
pub fn glob_base(base: &Path) -> String {
    glob::Pattern::escape(&base.to_string_lossy())
}
