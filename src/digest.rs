//! Content fingerprints: SHA-256 over the full byte sequence, rendered as
//! lowercase hex.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// A 32-byte SHA-256 digest.
pub type Fingerprint = [u8; 32];

pub fn fingerprint(bytes: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Formats bytes as lowercase hex, two digits per byte, in byte order.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub fn fingerprint_hex(bytes: &[u8]) -> String {
    to_hex(&fingerprint(bytes))
}

/// Reads the whole file into memory and fingerprints it.
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Read file for hashing: {:?}", path))?;
    Ok(fingerprint_hex(&bytes))
}
