//! ClaimCraft Merkle
//!
//! Leaf encoding and the sorted-pair binary Merkle tree whose root is
//! published on-chain.
//!
//! Every rule here must agree bit-for-bit with the claim contract's
//! verifier:
//!
//! - leaf = `keccak256(address ‖ uint256_be(amountWei))`
//! - parent = `keccak256(min(a, b) ‖ max(a, b))`
//! - an unpaired last node is carried up unchanged and adds no proof element
//! - the root of an empty tree is 32 zero bytes

mod leaf;
mod tree;

pub use leaf::{encode_leaf, merkle_leaf, EncodedLeaf, LEAF_ENCODING_LEN};
pub use tree::{hash_pair, MerkleProof, MerkleTree};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MerkleError {
    #[error("Leaf index {index} is out of bounds for tree with {leaf_count} leaves")]
    LeafIndexOutOfBounds { index: usize, leaf_count: usize },

    #[error("Invalid proof element: {0}")]
    InvalidProofElement(String),
}

pub type Result<T> = std::result::Result<T, MerkleError>;
