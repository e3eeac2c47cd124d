//! Deterministic ring hashing (§3 Data Model, §4.1 `GenHash`).
//!
//! `gen_hash` is the first 8 bytes of SHA-256, read little-endian, as the
//! spec requires (§8.2 S6: two runs with identical join order must produce
//! identical ring layouts).

use sha2::{Digest, Sha256};

/// Hash a ring key to its 64-bit position.
pub fn gen_hash(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    u64::from_le_bytes(digest[0..8].try_into().expect("sha256 digest is 32 bytes"))
}

/// Deterministic virtual-key naming: `vkey(parent, 0) = parent`,
/// `vkey(parent, n>0) = parent + "-" + n`.
pub fn vkey(parent: &str, n: u32) -> String {
    if n == 0 {
        parent.to_string()
    } else {
        format!("{parent}-{n}")
    }
}
