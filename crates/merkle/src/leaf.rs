//! Leaf encoding

use claimcraft_core::{keccak256, Address, CoreError, Hash32, TokenAmount, U256};

/// Bytes in a packed leaf preimage: 20-byte address + 32-byte amount.
pub const LEAF_ENCODING_LEN: usize = 52;

/// `abi.encodePacked(address, uint256)`: no padding, no length prefixes.
pub fn encode_leaf(address: &Address, amount_wei: &U256) -> [u8; LEAF_ENCODING_LEN] {
    let mut buf = [0u8; LEAF_ENCODING_LEN];
    buf[..20].copy_from_slice(address.as_slice());
    buf[20..].copy_from_slice(&amount_wei.to_be_bytes::<32>());
    buf
}

/// Leaf hash of one `(address, amountWei)` pair.
pub fn merkle_leaf(address: &Address, amount_wei: &U256) -> Hash32 {
    keccak256(encode_leaf(address, amount_wei))
}

/// A normalized entry together with its on-chain amount and leaf hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedLeaf {
    pub address: Address,
    /// Human units, as aggregated
    pub amount: TokenAmount,
    /// Smallest token units (`amount * 10^decimals`)
    pub amount_wei: U256,
    pub hash: Hash32,
}

impl EncodedLeaf {
    /// Scale `amount` to `decimals` and hash the packed pair.
    ///
    /// Fails with [`CoreError::ExcessPrecision`] when the amount has more
    /// significant fractional digits than the token, or
    /// [`CoreError::AmountOverflow`] when the scaled value exceeds 256 bits.
    pub fn encode(address: Address, amount: TokenAmount, decimals: u32) -> Result<Self, CoreError> {
        let amount_wei = amount.to_base_units(decimals)?;
        Ok(Self {
            address,
            amount,
            amount_wei,
            hash: merkle_leaf(&address, &amount_wei),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimcraft_core::{hash_to_hex, parse_address};

    const ADDR_A: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

    #[test]
    fn test_encode_leaf_layout() {
        let address = parse_address(ADDR_A).unwrap();
        let packed = encode_leaf(&address, &U256::from(0x0102u64));
        assert_eq!(&packed[..20], address.as_slice());
        assert!(packed[20..50].iter().all(|b| *b == 0));
        assert_eq!(packed[50], 0x01);
        assert_eq!(packed[51], 0x02);
    }

    #[test]
    fn test_merkle_leaf_vector() {
        let address = parse_address(ADDR_A).unwrap();
        let leaf = merkle_leaf(&address, &U256::from(1_000_000_000_000_000_000u64));
        assert_eq!(
            hash_to_hex(&leaf),
            "0x169e750aad61e480df8afbda26e8a1eccbd73bea2d5a492cc9948591769bee3b"
        );
    }

    #[test]
    fn test_encoded_leaf_scales_amount() {
        let address = parse_address(ADDR_A).unwrap();
        let encoded = EncodedLeaf::encode(address, "1".parse().unwrap(), 18).unwrap();
        assert_eq!(encoded.amount_wei, U256::from(1_000_000_000_000_000_000u64));
        assert_eq!(encoded.hash, merkle_leaf(&address, &encoded.amount_wei));
    }

    #[test]
    fn test_encoded_leaf_rejects_excess_precision() {
        let address = parse_address(ADDR_A).unwrap();
        let err = EncodedLeaf::encode(address, "0.001".parse().unwrap(), 2).unwrap_err();
        assert_eq!(err, CoreError::ExcessPrecision { scale: 3, decimals: 2 });
    }

    #[test]
    fn test_leaf_depends_on_amount() {
        let address = parse_address(ADDR_A).unwrap();
        assert_ne!(
            merkle_leaf(&address, &U256::from(1u64)),
            merkle_leaf(&address, &U256::from(2u64))
        );
    }
}
