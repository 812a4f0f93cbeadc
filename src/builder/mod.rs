//! Wheel build core.
//!
//! Stages, in pipeline order:
//! - `selection` resolves the files a wheel ships
//! - `naming` computes the artifact name and tags
//! - `metadata` assembles the `.dist-info` directory
//! - `wheel` writes the archive

pub mod metadata;
pub mod naming;
pub mod selection;
pub mod wheel;

pub use metadata::{assemble_metadata, DistInfo, Record};
pub use naming::{canonicalize_name, escape_name, ArtifactName, WheelTags};
pub use selection::{select_files, Manifest, ManifestEntry};
pub use wheel::{write_wheel, Compression, WheelWriter, DIST_DIR};
