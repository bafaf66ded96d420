//! Published artifacts

use std::collections::BTreeMap;

use claimcraft_core::{hash_to_hex, parse_address, parse_hash, Hash32, U256, ZERO_HASH};
use claimcraft_merkle::{merkle_leaf, MerkleProof, MerkleTree};
use serde::{Deserialize, Serialize};

use crate::{DistributionError, Result};

/// File name of the cross-bucket summary.
pub const ROOTS_FILE: &str = "roots.json";

/// File name of a bucket's pack.
pub fn pack_file_name(bucket: &str) -> String {
    format!("{}.json", bucket)
}

/// What one eligible address can claim, with the path proving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// Human units, canonical decimal
    pub amount: String,
    /// Smallest token units, decimal integer
    #[serde(rename = "amountWei")]
    pub amount_wei: String,
    /// `0x` hex sibling hashes, leaf to root
    pub proof: Vec<String>,
}

/// One bucket's root, leaf count and address→claim map.
///
/// Map keys are lowercase `0x` addresses. `BTreeMap` keeps serialization
/// order stable so identical input yields byte-identical files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionPack {
    pub root: String,
    pub count: usize,
    pub map: BTreeMap<String, ClaimRecord>,
}

impl DistributionPack {
    /// Pack for a bucket with no eligible addresses.
    pub fn empty() -> Self {
        Self {
            root: hash_to_hex(&ZERO_HASH),
            count: 0,
            map: BTreeMap::new(),
        }
    }

    pub fn root_hash(&self) -> Result<Hash32> {
        parse_hash(&self.root).map_err(|e| DistributionError::InvalidPack(e.to_string()))
    }

    pub fn summary(&self) -> RootSummary {
        RootSummary {
            root: self.root.clone(),
            count: self.count,
        }
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Recompute every leaf from its published fields and fold its proof.
    ///
    /// Returns the number of verified addresses. Fails on the first record
    /// that does not reproduce `root`, or when `count` disagrees with the map.
    pub fn verify(&self) -> Result<usize> {
        if self.count != self.map.len() {
            return Err(DistributionError::InvalidPack(format!(
                "count {} does not match {} map entries",
                self.count,
                self.map.len()
            )));
        }
        let root = self.root_hash()?;

        for (address_text, record) in &self.map {
            let address = parse_address(address_text)
                .map_err(|e| DistributionError::InvalidPack(e.to_string()))?;
            let amount_wei = U256::from_str_radix(&record.amount_wei, 10).map_err(|_| {
                DistributionError::InvalidPack(format!(
                    "amountWei for {} is not a decimal integer: {}",
                    address_text, record.amount_wei
                ))
            })?;
            let proof = MerkleProof::from_hex(&record.proof)
                .map_err(|e| DistributionError::InvalidPack(e.to_string()))?;

            let leaf = merkle_leaf(&address, &amount_wei);
            if !MerkleTree::verify(&root, &leaf, &proof) {
                return Err(DistributionError::ProofMismatch {
                    address: address_text.clone(),
                });
            }
        }

        Ok(self.map.len())
    }
}

/// Root and leaf count of one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSummary {
    pub root: String,
    pub count: usize,
}

/// Bucket name → [`RootSummary`], published as `roots.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootsIndex(pub BTreeMap<String, RootSummary>);

impl RootsIndex {
    pub fn insert(&mut self, bucket: impl Into<String>, summary: RootSummary) {
        self.0.insert(bucket.into(), summary);
    }

    pub fn get(&self, bucket: &str) -> Option<&RootSummary> {
        self.0.get(bucket)
    }

    pub fn buckets(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
