//! On-chain address text handling.
//!
//! Accepted input is strictly `0x` followed by 40 hex digits in any letter
//! case. Published maps are keyed by the lowercase form; human-facing output
//! uses the EIP-55 checksum casing.

use alloy_primitives::Address;

use crate::{CoreError, Result};

/// Number of hex characters in an address body.
pub const ADDRESS_HEX_LEN: usize = 40;

/// Returns true if `s` has the canonical textual address shape.
pub fn is_address_text(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(body) => body.len() == ADDRESS_HEX_LEN && body.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Parses an address in canonical textual form (case-insensitive).
///
/// Checksum casing is not enforced: mixed-case input that fails EIP-55 is
/// still the same 20 bytes, and eligibility lists routinely arrive in
/// arbitrary case.
pub fn parse_address(s: &str) -> Result<Address> {
    if !is_address_text(s) {
        return Err(CoreError::InvalidAddress(s.to_string()));
    }
    let mut bytes = [0u8; 20];
    hex::decode_to_slice(&s[2..], &mut bytes)
        .map_err(|e| CoreError::InvalidAddress(format!("{}: {}", s, e)))?;
    Ok(Address::from(bytes))
}

/// EIP-55 mixed-case form.
pub fn checksum_address(address: &Address) -> String {
    address.to_checksum(None)
}

/// Lowercase `0x`-prefixed form, used as the key of published maps.
pub fn lowercase_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}
