//! Hashing System
//!
//! MD5 as a stable identifier digest for serial numbers, SHA-256 for
//! artifact checksums. Neither is used for secrecy.

use md5::Md5;
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// 128-bit MD5 digest of `data`, read as a big-endian integer
pub fn identifier_digest(data: &[u8]) -> u128 {
    let mut hasher = Md5::new();
    hasher.update(data);
    u128::from_be_bytes(hasher.finalize().into())
}

/// Digest of `project_name || revision`, no separator
pub fn issuance_digest(project_name: &str, revision: &str) -> u128 {
    let mut input = String::with_capacity(project_name.len() + revision.len());
    input.push_str(project_name);
    input.push_str(revision);
    identifier_digest(input.as_bytes())
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}
