//! Core data structures for wharf.
//!
//! This module contains the project model every build stage reads:
//! - Versions and version constraints
//! - The project descriptor and its selection rules
//! - `pyproject.toml` loading
//! - Package layout detection

pub mod constraint;
pub mod errors;
pub mod layout;
pub mod project;
pub mod pyproject;
pub mod version;

pub use constraint::VersionConstraint;
pub use errors::{BuildError, ErrorKind};
pub use layout::{resolve_layout, LayoutKind, ResolvedPackage};
pub use project::{Dependency, Format, IncludeSpec, PackageSpec, ProjectDescriptor, SelectionRule};
pub use pyproject::{load_project, PYPROJECT_NAME};
pub use version::Version;
