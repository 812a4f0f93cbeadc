//! Package layout detection.
//!
//! Each [`PackageSpec`] is classified once, by looking at the filesystem,
//! into a [`LayoutKind`] that the file selection engine then expands.

use std::path::{Path, PathBuf};

use crate::core::errors::BuildError;
use crate::core::project::PackageSpec;
use crate::util::fs::glob_base;

/// Marker file that turns a directory into a regular package.
pub const PACKAGE_MARKER: &str = "__init__.py";

/// Shape of a declared package on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutKind {
    /// A lone `.py` file.
    SingleModule { path: PathBuf, name: String },
    /// A directory, walked recursively.
    PackageDirectory { path: PathBuf, name: String },
    /// Files matched by a glob include; the first one is the package's `__init__.py`.
    Glob { files: Vec<PathBuf>, name: String },
}

impl LayoutKind {
    /// Declared dotted name.
    pub fn name(&self) -> &str {
        match self {
            LayoutKind::SingleModule { name, .. }
            | LayoutKind::PackageDirectory { name, .. }
            | LayoutKind::Glob { name, .. } => name,
        }
    }
}

/// A package spec together with its detected layout.
#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    /// Directory archive paths are computed against (`root_dir` plus `from`).
    pub source_root: PathBuf,
    pub layout: LayoutKind,
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

fn dotted(include: &str) -> String {
    include
        .trim_end_matches('/')
        .trim_end_matches(".py")
        .replace(['/', '\\'], ".")
}

/// Classify `spec` by inspecting the filesystem under `root_dir`.
pub fn resolve_layout(root_dir: &Path, spec: &PackageSpec) -> Result<ResolvedPackage, BuildError> {
    let source_root = spec.source_root(root_dir);

    let layout = if is_glob(&spec.include) {
        resolve_glob(&source_root, &spec.include)?
    } else {
        classify(&source_root, &spec.include, &source_root.join(&spec.include))?
    };

    tracing::debug!("package `{}` resolved as {:?}", spec.include, layout);

    Ok(ResolvedPackage {
        source_root,
        layout,
    })
}

fn classify(source_root: &Path, include: &str, candidate: &Path) -> Result<LayoutKind, BuildError> {
    if candidate.is_dir() {
        if !candidate.join(PACKAGE_MARKER).is_file() {
            tracing::debug!(
                "{} has no {}; packaging it as a namespace package",
                candidate.display(),
                PACKAGE_MARKER
            );
        }
        return Ok(LayoutKind::PackageDirectory {
            path: candidate.to_path_buf(),
            name: dotted(include),
        });
    }

    if candidate.is_file() {
        return Ok(LayoutKind::SingleModule {
            path: candidate.to_path_buf(),
            name: dotted(include),
        });
    }

    let module = source_root.join(format!("{}.py", include));
    if module.is_file() {
        return Ok(LayoutKind::SingleModule {
            path: module,
            name: dotted(include),
        });
    }

    Err(BuildError::PackageNotFound {
        include: include.to_string(),
        path: candidate.to_path_buf(),
    })
}

fn resolve_glob(source_root: &Path, include: &str) -> Result<LayoutKind, BuildError> {
    let full = source_root.join(include);
    let pattern = format!("{}/{}", glob_base(source_root), include);

    let mut matches: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| BuildError::InvalidPattern {
            pattern: include.to_string(),
            message: e.to_string(),
        })?
        .map(|entry| {
            entry.map_err(|e| {
                let failed = e.path().to_path_buf();
                BuildError::io(failed, e.into_error())
            })
        })
        .collect::<Result<_, _>>()?;
    matches.sort();

    if matches.is_empty() {
        return Err(BuildError::PackageNotFound {
            include: include.to_string(),
            path: full.clone(),
        });
    }

    // A lone non-marker match is a module or a package directory in its own right.
    if let [single] = matches.as_slice() {
        if single.file_name().map_or(true, |n| n != PACKAGE_MARKER) {
            let relative = single.strip_prefix(source_root).unwrap_or(single);
            return classify(source_root, &relative.to_string_lossy(), single);
        }
    }

    let first = &matches[0];
    if first.file_name().map_or(true, |n| n != PACKAGE_MARKER) {
        return Err(BuildError::NotAPackage {
            path: first.clone(),
        });
    }
    let name = first
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let files = matches.into_iter().filter(|p| p.is_file()).collect();
    Ok(LayoutKind::Glob { files, name })
}
