//! Content hash computation for installation files using MD5
//!
//! MD5 is used purely as a change-detection fingerprint. It has to match what
//! the update service publishes, and it is not a security primitive here.

use crate::error::TreeError;
use crate::types::ContentHash;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Compute content hash for in-memory bytes
pub fn compute_content_hash(content: &[u8]) -> ContentHash {
    hex::encode(md5::compute(content).0)
}

/// Compute content hash for a file by streaming its bytes
///
/// The file is opened through any symlink; anything that cannot be read as a
/// regular byte stream is reported as an I/O error for that path.
pub fn hash_file(path: &Path) -> Result<ContentHash, TreeError> {
    let file = File::open(path).map_err(|e| TreeError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut context = md5::Context::new();
    io::copy(&mut reader, &mut context).map_err(|e| TreeError::io(path, e))?;
    Ok(hex::encode(context.compute().0))
}

/// Whether `value` looks like a hex MD5 digest as rendered by [`compute_content_hash`]
pub fn is_content_hash(value: &str) -> bool {
    value.len() == crate::types::CONTENT_HASH_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
