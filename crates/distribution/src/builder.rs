//! One bucket: ingestion through proofs

use std::collections::BTreeMap;
use std::fmt;

use claimcraft_core::{
    checksum_address, hash_to_hex, lowercase_address, CoreError, MAX_DECIMALS,
};
use claimcraft_ingest::{ingest, normalize, InputSource, SkipReason};
use claimcraft_merkle::{EncodedLeaf, MerkleTree};
use tracing::{debug, info, warn};

use crate::pack::{ClaimRecord, DistributionPack};
use crate::{validate_bucket_name, DistributionError, Result};

/// Counters and outcome of building one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub bucket: String,
    /// Non-blank data rows across all inputs
    pub rows: usize,
    /// Unique addresses before leaf encoding
    pub unique_addresses: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    pub root: String,
    /// Leaves in the tree (addresses in the pack)
    pub count: usize,
}

impl BuildReport {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: root {} count {} ({} rows, {} unique addresses, {} skipped",
            self.bucket,
            self.root,
            self.count,
            self.rows,
            self.unique_addresses,
            self.skipped_total(),
        )?;
        for (reason, n) in &self.skipped {
            write!(f, "; {} {}", reason, n)?;
        }
        f.write_str(")")
    }
}

/// A finished bucket, ready to publish.
#[derive(Debug, Clone)]
pub struct BucketBuild {
    pub name: String,
    pub pack: DistributionPack,
    pub report: BuildReport,
}

fn skip_reason_for(err: &CoreError) -> SkipReason {
    match err {
        CoreError::ExcessPrecision { .. } => SkipReason::ExcessPrecision,
        CoreError::AmountOverflow => SkipReason::AmountOverflow,
        _ => SkipReason::InvalidAmount,
    }
}

/// Build one bucket's pack from its inputs.
///
/// Every proof is checked against the root before returning; a failure
/// there is an internal fault and nothing from this bucket may be
/// published.
pub fn build_bucket(
    name: &str,
    sources: &[Box<dyn InputSource>],
    decimals: u32,
) -> Result<BucketBuild> {
    validate_bucket_name(name)?;
    if decimals > MAX_DECIMALS {
        return Err(DistributionError::InvalidDecimals(decimals));
    }

    let table = ingest(sources)?;
    let mut report = table.report;
    let entries = normalize(&table.entries, &mut report);
    let unique_addresses = entries.len();

    let mut leaves = Vec::with_capacity(entries.len());
    for entry in entries {
        match EncodedLeaf::encode(entry.address, entry.amount, decimals) {
            Ok(leaf) => leaves.push(leaf),
            Err(e) => {
                warn!("Skipping {} in bucket {}: {}", entry.checksummed(), name, e);
                report.reject(skip_reason_for(&e));
            }
        }
    }

    let tree = MerkleTree::from_leaves(leaves.iter().map(|leaf| leaf.hash).collect());
    let root = tree.root();

    let mut map = BTreeMap::new();
    for leaf in &leaves {
        let proof = tree
            .proof_for_leaf(&leaf.hash)
            .ok_or_else(|| DistributionError::SelfCheckFailed {
                bucket: name.to_string(),
                address: checksum_address(&leaf.address),
            })?;
        if !MerkleTree::verify(&root, &leaf.hash, &proof) {
            return Err(DistributionError::SelfCheckFailed {
                bucket: name.to_string(),
                address: checksum_address(&leaf.address),
            });
        }
        map.insert(
            lowercase_address(&leaf.address),
            ClaimRecord {
                amount: leaf.amount.to_string(),
                amount_wei: leaf.amount_wei.to_string(),
                proof: proof.to_hex(),
            },
        );
    }
    debug!("Verified {} proofs for bucket {}", map.len(), name);

    let pack = DistributionPack {
        root: hash_to_hex(&root),
        count: map.len(),
        map,
    };

    let report = BuildReport {
        bucket: name.to_string(),
        rows: report.rows,
        unique_addresses,
        skipped: report.skipped,
        root: pack.root.clone(),
        count: pack.count,
    };
    info!("Built bucket {}", report);

    Ok(BucketBuild {
        name: name.to_string(),
        pack,
        report,
    })
}
