//! Sorted-pair binary Merkle tree

use claimcraft_core::{hash_to_hex, keccak256, parse_hash, Hash32, ZERO_HASH};
use tracing::debug;

use crate::{MerkleError, Result};

/// Commutative parent hash: the two children are ordered by byte value
/// before hashing, so verifiers never need left/right position bits.
pub fn hash_pair(a: &Hash32, b: &Hash32) -> Hash32 {
    let (left, right) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left);
    buf[32..].copy_from_slice(right);
    keccak256(buf)
}

/// Sibling hashes from the leaf level upward.
///
/// Levels where the path node was carried up unpaired contribute nothing,
/// so a proof can be shorter than the tree height.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerkleProof {
    pub siblings: Vec<Hash32>,
}

impl MerkleProof {
    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    /// Fold `leaf` through every sibling with [`hash_pair`].
    pub fn compute_root(&self, leaf: &Hash32) -> Hash32 {
        self.siblings
            .iter()
            .fold(*leaf, |node, sibling| hash_pair(&node, sibling))
    }

    /// `0x`-prefixed hex strings, leaf-to-root order.
    pub fn to_hex(&self) -> Vec<String> {
        self.siblings.iter().map(hash_to_hex).collect()
    }

    pub fn from_hex<S: AsRef<str>>(items: &[S]) -> Result<Self> {
        let siblings = items
            .iter()
            .map(|s| {
                parse_hash(s.as_ref())
                    .map_err(|_| MerkleError::InvalidProofElement(s.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { siblings })
    }
}

/// All layers of the tree, leaves first.
///
/// Layer 0 holds the leaves sorted ascending by byte value, so the root
/// depends only on the set of leaves and never on input order.
#[derive(Debug, Clone, Default)]
pub struct MerkleTree {
    layers: Vec<Vec<Hash32>>,
}

impl MerkleTree {
    /// Build a tree over `leaves` (any order).
    pub fn from_leaves(mut leaves: Vec<Hash32>) -> Self {
        if leaves.is_empty() {
            return Self::default();
        }
        leaves.sort_unstable();

        let mut layers = vec![leaves];
        loop {
            let next: Vec<Hash32> = match layers.last() {
                Some(layer) if layer.len() > 1 => layer
                    .chunks(2)
                    .map(|pair| match pair {
                        [left, right] => hash_pair(left, right),
                        _ => pair[0],
                    })
                    .collect(),
                _ => break,
            };
            layers.push(next);
        }

        debug!(
            "Built Merkle tree: {} leaves, {} layers",
            layers[0].len(),
            layers.len()
        );
        Self { layers }
    }

    /// The root, or [`ZERO_HASH`] for an empty tree.
    pub fn root(&self) -> Hash32 {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or(ZERO_HASH)
    }

    pub fn layers(&self) -> &[Vec<Hash32>] {
        &self.layers
    }

    pub fn leaves(&self) -> &[Hash32] {
        self.layers.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    /// Index of `leaf` in the sorted leaf layer.
    pub fn position(&self, leaf: &Hash32) -> Option<usize> {
        self.leaves().binary_search(leaf).ok()
    }

    /// Authentication path for the leaf at `index` in layer 0.
    pub fn proof(&self, index: usize) -> Result<MerkleProof> {
        let leaf_count = self.leaf_count();
        if index >= leaf_count {
            return Err(MerkleError::LeafIndexOutOfBounds { index, leaf_count });
        }

        let mut siblings = Vec::with_capacity(self.layers.len().saturating_sub(1));
        let mut current = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            if let Some(sibling) = layer.get(current ^ 1) {
                siblings.push(*sibling);
            }
            current /= 2;
        }

        Ok(MerkleProof { siblings })
    }

    /// Authentication path for a leaf hash, if it is in the tree.
    pub fn proof_for_leaf(&self, leaf: &Hash32) -> Option<MerkleProof> {
        let index = self.position(leaf)?;
        self.proof(index).ok()
    }

    /// Check `proof` the way the claim contract does.
    pub fn verify(root: &Hash32, leaf: &Hash32, proof: &MerkleProof) -> bool {
        proof.compute_root(leaf) == *root
    }
}
