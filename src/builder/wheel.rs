//! Archive writer.
//!
//! Writes the wheel zip into a temporary file next to its destination and
//! persists it only once the `RECORD` is written. Entry timestamps and
//! permissions are fixed so identical inputs give identical bytes.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::builder::metadata::{DistInfo, Record};
use crate::builder::selection::Manifest;
use crate::core::errors::BuildError;

/// Directory, relative to the project root, artifacts are written to.
pub const DIST_DIR: &str = "dist";

/// Compression applied to every non-empty entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Deflate, at the given level or the library default.
    Deflated(Option<i64>),
    Stored,
}

impl Default for Compression {
    fn default() -> Self {
        Compression::Deflated(None)
    }
}

impl Compression {
    fn options(self, len: usize) -> SimpleFileOptions {
        let base = SimpleFileOptions::default()
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        match self {
            Compression::Deflated(level) if len > 0 => base
                .compression_method(CompressionMethod::Deflated)
                .compression_level(level),
            _ => base.compression_method(CompressionMethod::Stored),
        }
    }
}

/// Incremental writer for one wheel.
pub struct WheelWriter {
    zip: ZipWriter<NamedTempFile>,
    dest: PathBuf,
    compression: Compression,
    written: HashSet<String>,
    record: Record,
}

impl WheelWriter {
    /// Start a wheel that will be persisted at `dest`, creating its directory.
    pub fn create(dest: &Path, compression: Compression) -> Result<Self, BuildError> {
        let dir = dest.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
        let tmp = NamedTempFile::new_in(dir).map_err(|e| BuildError::io(dir, e))?;

        Ok(WheelWriter {
            zip: ZipWriter::new(tmp),
            dest: dest.to_path_buf(),
            compression,
            written: HashSet::new(),
            record: Record::new(),
        })
    }

    /// Add one entry and record its digest.
    pub fn add(&mut self, archive_path: &str, contents: &[u8]) -> Result<(), BuildError> {
        if !self.written.insert(archive_path.to_string()) {
            return Err(BuildError::DuplicateEntry {
                path: archive_path.to_string(),
            });
        }

        self.write_entry(archive_path, contents)?;
        self.record.add(archive_path, contents);
        Ok(())
    }

    fn write_entry(&mut self, archive_path: &str, contents: &[u8]) -> Result<(), BuildError> {
        let options = self.compression.options(contents.len());
        self.zip
            .start_file(archive_path, options)
            .map_err(|e| BuildError::Archive {
                path: self.dest.clone(),
                source: e,
            })?;
        self.zip
            .write_all(contents)
            .map_err(|e| BuildError::io(&self.dest, e))
    }

    /// Write `RECORD` at `record_path`, close the archive and move it into place.
    pub fn finish(mut self, record_path: &str) -> Result<PathBuf, BuildError> {
        if self.written.contains(record_path) {
            return Err(BuildError::DuplicateEntry {
                path: record_path.to_string(),
            });
        }

        let record = std::mem::take(&mut self.record).finish(record_path);
        self.write_entry(record_path, record.as_bytes())?;

        let dest = self.dest;
        let tmp = self.zip.finish().map_err(|e| BuildError::Archive {
            path: dest.clone(),
            source: e,
        })?;
        tmp.as_file().sync_all().map_err(|e| BuildError::io(&dest, e))?;
        tmp.persist(&dest).map_err(|e| BuildError::io(&dest, e.error))?;

        Ok(dest)
    }
}

/// Write `manifest` then `dist_info` to a wheel at `dest`.
///
/// Entries go in manifest order, then the dist-info files, then `RECORD`.
/// Nothing is left at `dest` if any step fails.
pub fn write_wheel(
    dest: &Path,
    manifest: &Manifest,
    dist_info: &DistInfo,
    compression: Compression,
) -> Result<PathBuf, BuildError> {
    let mut writer = WheelWriter::create(dest, compression)?;

    for entry in manifest.iter() {
        let contents = std::fs::read(&entry.source_path)
            .map_err(|e| BuildError::io(&entry.source_path, e))?;
        writer.add(&entry.archive_path, &contents)?;
    }
    for file in &dist_info.files {
        writer.add(&file.archive_path, &file.contents)?;
    }

    let path = writer.finish(&dist_info.record_path())?;
    tracing::debug!("wrote {} entries to {}", manifest.len() + dist_info.files.len() + 1, path.display());
    Ok(path)
}
