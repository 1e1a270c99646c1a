//! Digest helpers used for certificate fingerprints.

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Compute the SHA-1 digest of bytes as lowercase hex.
pub fn sha1_bytes(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute SHA256 hash of bytes.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Render bytes as uppercase, colon-separated hex (`AB:CD:EF`).
pub fn colon_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}
