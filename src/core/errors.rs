//! Build error taxonomy and diagnostics.

use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Broad category of a [`BuildError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing project metadata, or a declared package missing on disk.
    Configuration,
    /// Nothing survived file selection.
    Selection,
    /// Filesystem or archive failure.
    Io,
    /// A contract between build stages was violated.
    InternalConsistency,
}

/// Error raised by the wheel build core.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum BuildError {
    #[error("missing required field `{field}`")]
    #[diagnostic(code(wharf::config::missing_field))]
    MissingField { field: String },

    #[error("invalid version `{version}`")]
    #[diagnostic(
        code(wharf::config::invalid_version),
        help("versions look like `1.2.3`, `0.1b1`, `2.0rc1`, `1.0.post2` or `1.0.dev3`")
    )]
    InvalidVersion { version: String },

    #[error("invalid project name `{name}`")]
    #[diagnostic(code(wharf::config::invalid_name))]
    InvalidName { name: String },

    #[error("invalid version constraint `{constraint}`")]
    #[diagnostic(code(wharf::config::invalid_constraint))]
    InvalidConstraint { constraint: String },

    #[error("package `{include}` not found at {}", .path.display())]
    #[diagnostic(code(wharf::config::package_not_found))]
    PackageNotFound { include: String, path: PathBuf },

    #[error("{} is not a package", .path.display())]
    #[diagnostic(
        code(wharf::config::not_a_package),
        help("a glob package include must match an `__init__.py` first")
    )]
    NotAPackage { path: PathBuf },

    #[error("invalid pattern `{pattern}`: {message}")]
    #[diagnostic(code(wharf::config::invalid_pattern))]
    InvalidPattern { pattern: String, message: String },

    #[error("failed to parse {}: {message}", .path.display())]
    #[diagnostic(code(wharf::config::manifest))]
    Manifest { path: PathBuf, message: String },

    #[error("no files selected for the wheel in {}", .root.display())]
    #[diagnostic(code(wharf::selection::empty))]
    NoFiles { root: PathBuf },

    #[error("failed to query ignored files in {}: {message}", .root.display())]
    #[diagnostic(code(wharf::vcs))]
    Vcs { root: PathBuf, message: String },

    #[error("I/O error on {}", .path.display())]
    #[diagnostic(code(wharf::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write archive {}", .path.display())]
    #[diagnostic(code(wharf::io::archive))]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("duplicate archive entry `{path}`")]
    #[diagnostic(code(wharf::internal::duplicate_entry))]
    DuplicateEntry { path: String },
}

impl BuildError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::MissingField { .. }
            | BuildError::InvalidVersion { .. }
            | BuildError::InvalidName { .. }
            | BuildError::InvalidConstraint { .. }
            | BuildError::PackageNotFound { .. }
            | BuildError::NotAPackage { .. }
            | BuildError::InvalidPattern { .. }
            | BuildError::Manifest { .. } => ErrorKind::Configuration,
            BuildError::NoFiles { .. } => ErrorKind::Selection,
            BuildError::Vcs { .. } | BuildError::Io { .. } | BuildError::Archive { .. } => {
                ErrorKind::Io
            }
            BuildError::DuplicateEntry { .. } => ErrorKind::InternalConsistency,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());

        match self {
            BuildError::MissingField { field } => diag
                .with_context(format!("`[tool.poetry]` has no usable `{}`", field))
                .with_suggestion(format!("Declare a non-empty `{}` in pyproject.toml", field)),

            BuildError::InvalidVersion { .. } => diag
                .with_context("versions must be a numeric release with optional pre, post or dev parts")
                .with_suggestion("Use a version such as `1.0.0`, `1.0b1` or `1.0.post1`"),

            BuildError::PackageNotFound { include, path } => diag
                .with_location(path)
                .with_context(format!("looked for a directory or `{}.py`", include))
                .with_suggestion("Check the `include` and `from` keys of the `packages` entry"),

            BuildError::NoFiles { .. } => diag
                .with_context("every candidate was excluded or ignored by version control")
                .with_suggestion(suggestions::NO_FILES),

            BuildError::Io { path, source } => diag
                .with_location(path)
                .with_context(source.to_string()),

            BuildError::DuplicateEntry { .. } => diag
                .with_context("file selection produced two entries with the same archive path")
                .with_suggestion(suggestions::REPORT_BUG),

            _ => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = BuildError::MissingField {
            field: "version".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = BuildError::NoFiles {
            root: PathBuf::from("/project"),
        };
        assert_eq!(err.kind(), ErrorKind::Selection);

        let err = BuildError::DuplicateEntry {
            path: "pkg/__init__.py".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::InternalConsistency);

        let err = BuildError::io("/missing", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_package_not_found_diagnostic() {
        let err = BuildError::PackageNotFound {
            include: "my_package".to_string(),
            path: PathBuf::from("/project/src/my_package"),
        };

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("package `my_package` not found"));
        assert!(output.contains("--> /project/src/my_package"));
        assert!(output.contains("my_package.py"));
        assert!(output.contains("help: consider:"));
    }
}
