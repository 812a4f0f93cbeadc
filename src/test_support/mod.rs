//! Test utilities for wharf unit tests.
//!
//! Project trees are written to real temporary directories; built wheels
//! are inspected with the `zip` reader.

pub mod fixtures;

use std::io::Read;
use std::path::{Path, PathBuf};

pub use fixtures::*;

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create parent dir");
    }
    std::fs::write(&path, contents).expect("failed to write file");
    path
}

/// Entry names of the zip archive at `path`, in archive order.
pub fn zip_entries(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).expect("failed to open archive");
    let mut archive = zip::ZipArchive::new(file).expect("not a zip archive");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("bad entry").name().to_string())
        .collect()
}

/// Contents of one entry of the zip archive at `path`.
pub fn zip_read(path: &Path, name: &str) -> String {
    let file = std::fs::File::open(path).expect("failed to open archive");
    let mut archive = zip::ZipArchive::new(file).expect("not a zip archive");
    let mut entry = archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("no entry `{}`", name));
    let mut contents = String::new();
    entry
        .read_to_string(&mut contents)
        .expect("entry is not UTF-8");
    contents
}
