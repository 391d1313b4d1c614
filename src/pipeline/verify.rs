//! Source integrity check.

use crate::error::ConvertError;
use crate::io::FileSystem;
use sha2::{Digest, Sha256};
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Lowercase hex SHA-256 of everything `reader` yields.
pub fn sha256_hex(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Fail unless `path` hashes to `expected` (lowercase hex, compared
/// exactly; surrounding whitespace is ignored).
pub fn verify_digest(fs: &dyn FileSystem, path: &Path, expected: &str) -> Result<(), ConvertError> {
    if !fs.exists(path) {
        return Err(ConvertError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let actual = sha256_hex(fs.open(path)?)?;
    if actual != expected.trim() {
        return Err(ConvertError::DigestMismatch {
            path: path.to_path_buf(),
            expected: expected.trim().to_string(),
            actual,
        });
    }

    debug!("Digest verified for {}", path.display());
    Ok(())
}
