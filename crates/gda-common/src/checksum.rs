//! SHA-256 checksums for content addressing and download verification

use crate::error::{GdaError, Result};
use sha2::{Digest, Sha256};
use std::io::Read;

/// Hex digest of an in-memory buffer
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compute the digest of any readable source, streaming in 8 KiB chunks
pub fn compute_sha256<R: Read>(reader: &mut R) -> Result<String> {
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

/// Compare the digest of `reader` against an expected one (case-insensitive)
pub fn verify_sha256<R: Read>(reader: &mut R, expected: &str) -> Result<()> {
    let actual = compute_sha256(reader)?;
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(GdaError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}
