//! wharf - builds pure-Python wheel archives
//!
//! This crate provides the library behind the `wharf` CLI: project loading,
//! file selection, metadata assembly and deterministic archive writing.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;
pub mod vcs;

/// Project fixtures and helpers for wharf unit tests.
///
/// Fixture trees are written to temporary directories; built wheels are
/// read back with the `zip` reader.
#[cfg(test)]
pub mod test_support;

pub use builder::{ArtifactName, Manifest, ManifestEntry};
pub use core::{BuildError, ErrorKind, ProjectDescriptor, Version, VersionConstraint};
pub use ops::{build_wheel, BuiltWheel, WheelOptions};
pub use util::context::GlobalContext;
