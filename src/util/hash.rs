//! Hashing utilities for content comparison and RECORD digests.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Compute SHA256 hash of a file.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Digest in the form wheel RECORD files use: `sha256=` followed by the
/// URL-safe, unpadded base64 of the raw digest.
pub fn record_digest(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    format!("sha256={}", URL_SAFE_NO_PAD.encode(digest))
}
