//! Keccak-256 helpers and 32-byte hash text encoding.

use crate::{CoreError, Result};

/// A 32-byte keccak-256 digest (leaf, interior node or root).
pub type Hash32 = [u8; 32];

/// Root published for a bucket with no eligible addresses.
pub const ZERO_HASH: Hash32 = [0u8; 32];

/// Keccak-256 as used by the EVM (not NIST SHA3-256).
pub fn keccak256(data: impl AsRef<[u8]>) -> Hash32 {
    alloy_primitives::keccak256(data).0
}

/// `0x` + 64 lowercase hex characters.
pub fn hash_to_hex(hash: &Hash32) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Parses the output of [`hash_to_hex`] (hex digits may be any case).
pub fn parse_hash(s: &str) -> Result<Hash32> {
    let body = s
        .strip_prefix("0x")
        .ok_or_else(|| CoreError::InvalidHash(s.to_string()))?;
    if body.len() != 64 {
        return Err(CoreError::InvalidHash(s.to_string()));
    }
    let mut hash = [0u8; 32];
    hex::decode_to_slice(body, &mut hash)
        .map_err(|e| CoreError::InvalidHash(format!("{}: {}", s, e)))?;
    Ok(hash)
}
