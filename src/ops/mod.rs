//! High-level operations.
//!
//! This module contains the implementation of wharf commands.

pub mod build_wheel;
pub mod legacy;

pub use build_wheel::{build_wheel, list_files, BuiltWheel, WheelOptions};
pub use legacy::{LegacyExtractor, LegacyMetadata};
