//! Loaded packs

use std::collections::BTreeMap;
use std::path::Path;

use claimcraft_core::{is_address_text, is_bucket_name};
use claimcraft_distribution::{pack_file_name, ClaimRecord, DistributionPack, RootsIndex, ROOTS_FILE};
use tracing::{debug, info};

use crate::{QueryError, Result};

/// Every published bucket held in memory.
#[derive(Debug, Clone, Default)]
pub struct ProofStore {
    packs: BTreeMap<String, DistributionPack>,
    roots: RootsIndex,
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| QueryError::ReadError {
        path: path.display().to_string(),
        source,
    })
}

fn check_count(bucket: &str, pack: &DistributionPack) -> Result<()> {
    if pack.count != pack.map.len() {
        return Err(QueryError::InconsistentPack {
            bucket: bucket.to_string(),
            reason: format!("count {} but {} map entries", pack.count, pack.map.len()),
        });
    }
    Ok(())
}

impl ProofStore {
    /// Load `roots.json` and every pack it lists from `dir`.
    ///
    /// A pack whose root or count disagrees with `roots.json`, or whose count
    /// disagrees with its own map, is rejected. So is a listed bucket whose
    /// name is not a valid pack file stem.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let roots = RootsIndex::from_json_slice(&read_file(&dir.join(ROOTS_FILE))?)?;

        let mut packs = BTreeMap::new();
        for (bucket, summary) in &roots.0 {
            if !is_bucket_name(bucket) {
                return Err(QueryError::InconsistentPack {
                    bucket: bucket.clone(),
                    reason: "listed bucket name cannot name a pack file".to_string(),
                });
            }
            let path = dir.join(pack_file_name(bucket));
            let pack = DistributionPack::from_json_slice(&read_file(&path)?)?;
            check_count(bucket, &pack)?;
            if pack.summary() != *summary {
                return Err(QueryError::InconsistentPack {
                    bucket: bucket.clone(),
                    reason: format!(
                        "pack has root {} count {}, roots index has root {} count {}",
                        pack.root, pack.count, summary.root, summary.count
                    ),
                });
            }
            debug!("Loaded {}: {} addresses", path.display(), pack.count);
            packs.insert(bucket.clone(), pack);
        }

        info!("Loaded {} buckets from {}", packs.len(), dir.display());
        Ok(Self { packs, roots })
    }

    /// Store over already-parsed packs; the roots index is derived from them.
    pub fn from_packs(packs: impl IntoIterator<Item = (String, DistributionPack)>) -> Result<Self> {
        let mut store = Self::default();
        for (bucket, pack) in packs {
            check_count(&bucket, &pack)?;
            store.roots.insert(bucket.clone(), pack.summary());
            store.packs.insert(bucket, pack);
        }
        Ok(store)
    }

    /// Claim record for `address` in `bucket`.
    ///
    /// The address must be exactly `0x` + 40 hex characters in any case, with
    /// no surrounding whitespace; it is lowercased for the lookup. `Ok(None)` means the address is simply not
    /// eligible in this bucket.
    pub fn get_proof(&self, bucket: &str, address: &str) -> Result<Option<&ClaimRecord>> {
        if !is_address_text(address) {
            return Err(QueryError::MalformedAddress(address.to_string()));
        }
        let pack = self
            .packs
            .get(bucket)
            .ok_or_else(|| QueryError::UnknownBucket(bucket.to_string()))?;
        Ok(pack.map.get(&address.to_ascii_lowercase()))
    }

    pub fn roots(&self) -> &RootsIndex {
        &self.roots
    }

    pub fn pack(&self, bucket: &str) -> Option<&DistributionPack> {
        self.packs.get(bucket)
    }

    pub fn buckets(&self) -> impl Iterator<Item = &str> {
        self.packs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.packs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimcraft_distribution::{BucketSpec, DirectorySink, Distributor};
    use claimcraft_ingest::MemorySource;

    const ADDR_A: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
    const ADDR_B: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";
    const ADDR_C: &str = "0xdbf03b407c01e7cd3cbea99509d93f8dddc8c6fb";

    fn publish(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("claimcraft-store-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let buckets = vec![
            BucketSpec::new(
                "base",
                vec![Box::new(MemorySource::new("base.csv", format!("{},1\n{},2\n", ADDR_A, ADDR_B)))],
            ),
            BucketSpec::new("empty", vec![Box::new(MemorySource::new("empty.csv", ""))]),
        ];
        Distributor::new(18)
            .run(&buckets, &mut DirectorySink::new(&dir))
            .unwrap();
        dir
    }

    #[test]
    fn test_load_dir_and_lookup() {
        let dir = publish("lookup");
        let store = ProofStore::load_dir(&dir).unwrap();
        assert_eq!(store.buckets().collect::<Vec<_>>(), vec!["base", "empty"]);

        let checksummed = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        let record = store.get_proof("base", checksummed).unwrap().unwrap();
        assert_eq!(record.amount, "1");
        assert_eq!(record.amount_wei, "1000000000000000000");

        assert!(store.get_proof("base", ADDR_C).unwrap().is_none());
        assert!(store.get_proof("empty", ADDR_A).unwrap().is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_lookup_errors() {
        let dir = publish("errors");
        let store = ProofStore::load_dir(&dir).unwrap();
        assert!(matches!(
            store.get_proof("base", "0xZZZZ6053f3e94c9b9a09f33669435e7ef1beaed"),
            Err(QueryError::MalformedAddress(_))
        ));
        assert!(matches!(
            store.get_proof("bonus", ADDR_A),
            Err(QueryError::UnknownBucket(_))
        ));
        assert!(matches!(
            store.get_proof("base", &format!(" {}", ADDR_A)),
            Err(QueryError::MalformedAddress(_))
        ));
        assert!(matches!(
            store.get_proof("base", &format!("{}\n", ADDR_A)),
            Err(QueryError::MalformedAddress(_))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_rejects_root_mismatch() {
        let dir = publish("mismatch");
        let path = dir.join("roots.json");
        let text = std::fs::read_to_string(&path).unwrap();
        let mut roots: serde_json::Value = serde_json::from_str(&text).unwrap();
        roots["base"]["root"] = serde_json::Value::String(format!("0x{}", "11".repeat(32)));
        std::fs::write(&path, serde_json::to_vec(&roots).unwrap()).unwrap();

        assert!(matches!(
            ProofStore::load_dir(&dir),
            Err(QueryError::InconsistentPack { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_rejects_roots_listed_as_bucket() {
        let dir = publish("reserved");
        let path = dir.join(ROOTS_FILE);
        let text = std::fs::read_to_string(&path).unwrap();
        let mut roots: serde_json::Value = serde_json::from_str(&text).unwrap();
        roots["roots"] = roots["empty"].clone();
        std::fs::write(&path, serde_json::to_vec(&roots).unwrap()).unwrap();

        assert!(matches!(
            ProofStore::load_dir(&dir),
            Err(QueryError::InconsistentPack { ref bucket, .. }) if bucket == "roots"
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_dir() {
        let dir = std::env::temp_dir().join("claimcraft-store-does-not-exist");
        assert!(matches!(
            ProofStore::load_dir(&dir),
            Err(QueryError::ReadError { .. })
        ));
    }

    #[test]
    fn test_from_packs_rejects_bad_count() {
        let mut pack = DistributionPack::empty();
        pack.count = 3;
        assert!(ProofStore::from_packs(vec![("base".to_string(), pack)]).is_err());
    }
}
