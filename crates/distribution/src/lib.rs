//! ClaimCraft Distribution
//!
//! Builds one independent Merkle distribution per bucket and publishes the
//! resulting packs.
//!
//! ## Flow
//!
//! 1. Each bucket's inputs are ingested and aggregated.
//! 2. Entries are encoded to leaves, the tree is built and every proof is
//!    checked against the root.
//! 3. All packs plus the `roots.json` summary go to an [`ArtifactSink`] in
//!    a single call, so a failed run publishes nothing.
//!
//! ## Artifacts
//!
//! - `<bucket>.json`: `{root, count, map: {address: {amount, amountWei, proof}}}`
//! - `roots.json`: `{bucket: {root, count}}`

mod builder;
mod pack;
mod sink;

pub use builder::{build_bucket, BucketBuild, BuildReport};
pub use pack::{pack_file_name, ClaimRecord, DistributionPack, RootSummary, RootsIndex, ROOTS_FILE};
pub use sink::{Artifact, ArtifactSink, DirectorySink, MemorySink};

use std::collections::HashSet;

use claimcraft_core::is_bucket_name;
use claimcraft_ingest::{IngestError, InputSource};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum DistributionError {
    #[error("Invalid bucket name {0:?}: use lowercase letters, digits, '-' and '_' (not \"roots\")")]
    InvalidBucketName(String),

    #[error("Bucket {0} is configured more than once")]
    DuplicateBucket(String),

    #[error("Artifact {0} would be written more than once")]
    DuplicateArtifact(String),

    #[error("Token decimals {0} exceed the supported maximum")]
    InvalidDecimals(u32),

    #[error("Ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    #[error("Proof self-check failed in bucket {bucket} for {address}")]
    SelfCheckFailed { bucket: String, address: String },

    #[error("Proof for {address} does not reproduce the pack root")]
    ProofMismatch { address: String },

    #[error("Invalid pack: {0}")]
    InvalidPack(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to create directory {path}: {source}")]
    CreateDirError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DistributionError>;

/// Bucket names become file names, so only `[a-z0-9_-]+` is allowed and
/// `roots` is reserved for the index.
pub fn validate_bucket_name(name: &str) -> Result<()> {
    if is_bucket_name(name) {
        Ok(())
    } else {
        Err(DistributionError::InvalidBucketName(name.to_string()))
    }
}

/// A bucket to build: its name and eligibility inputs.
pub struct BucketSpec {
    pub name: String,
    pub sources: Vec<Box<dyn InputSource>>,
}

impl BucketSpec {
    pub fn new(name: impl Into<String>, sources: Vec<Box<dyn InputSource>>) -> Self {
        Self {
            name: name.into(),
            sources,
        }
    }
}

/// Runs every bucket for a token and publishes the results together.
#[derive(Debug, Clone, Copy)]
pub struct Distributor {
    decimals: u32,
}

impl Distributor {
    pub fn new(decimals: u32) -> Self {
        Self { decimals }
    }

    /// Build all buckets without publishing.
    ///
    /// Buckets are built one after another; any failure aborts the run.
    pub fn build_all(&self, buckets: &[BucketSpec]) -> Result<Vec<BucketBuild>> {
        let mut seen = HashSet::new();
        for bucket in buckets {
            validate_bucket_name(&bucket.name)?;
            if !seen.insert(bucket.name.as_str()) {
                return Err(DistributionError::DuplicateBucket(bucket.name.clone()));
            }
        }

        buckets
            .iter()
            .map(|bucket| build_bucket(&bucket.name, &bucket.sources, self.decimals))
            .collect()
    }

    /// Serialize built buckets into their pack files plus `roots.json`.
    pub fn artifacts(builds: &[BucketBuild]) -> Result<Vec<Artifact>> {
        let mut index = RootsIndex::default();
        let mut artifacts = Vec::with_capacity(builds.len() + 1);
        for build in builds {
            validate_bucket_name(&build.name)?;
            artifacts.push(Artifact::new(
                pack_file_name(&build.name),
                build.pack.to_json_bytes()?,
            ));
            index.insert(build.name.clone(), build.pack.summary());
        }
        artifacts.push(Artifact::new(ROOTS_FILE, index.to_json_bytes()?));
        Ok(artifacts)
    }

    /// Build every bucket, then publish all artifacts in one `publish` call.
    pub fn run(&self, buckets: &[BucketSpec], sink: &mut dyn ArtifactSink) -> Result<Vec<BuildReport>> {
        let builds = self.build_all(buckets)?;
        let artifacts = Self::artifacts(&builds)?;
        sink.publish(&artifacts)?;

        info!(
            "Distribution complete: {} buckets, {} artifacts",
            builds.len(),
            artifacts.len()
        );
        Ok(builds.into_iter().map(|build| build.report).collect())
    }
}
