//! Build pipeline integration tests
//!
//! Runs eligibility files through ingestion, aggregation, tree building and
//! publishing, then checks the published packs:
//! 1. Skip accounting over a mixed-quality input
//! 2. Determinism across row order and address casing
//! 3. Every published proof reproduces its root
//! 4. Tree shape edge cases (odd count, single leaf, empty bucket)
//! 5. Directory publishing and reloading

use std::path::PathBuf;

use claimcraft_core::{hash_to_hex, parse_address, parse_hash, Hash32, U256, ZERO_HASH};
use claimcraft_distribution::{
    build_bucket, BucketSpec, DirectorySink, DistributionPack, Distributor, MemorySink,
    RootsIndex, ROOTS_FILE,
};
use claimcraft_ingest::{InputSource, MemorySource, SkipReason};
use claimcraft_logging::{try_init, LogLevel};
use claimcraft_merkle::{merkle_leaf, MerkleProof, MerkleTree};
use claimcraft_query::ProofStore;

const ADDR_A: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
const ADDR_B: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";
const ADDR_C: &str = "0xdbf03b407c01e7cd3cbea99509d93f8dddc8c6fb";

fn init_logging() {
    let _ = try_init(LogLevel::Debug);
}

fn sources(name: &str, text: impl Into<Vec<u8>>) -> Vec<Box<dyn InputSource>> {
    vec![Box::new(MemorySource::new(name, text))]
}

/// `0x` + 40 hex, distinct per index.
fn address(i: usize) -> String {
    format!("0x{:040x}", i + 1)
}

fn leaf_of(address_text: &str, amount_wei: &str) -> Hash32 {
    let address = parse_address(address_text).unwrap();
    let wei = U256::from_str_radix(amount_wei, 10).unwrap();
    merkle_leaf(&address, &wei)
}

/// Fold every record's proof by hand and compare with the pack root.
fn assert_all_proofs_verify(pack: &DistributionPack) {
    let root = parse_hash(&pack.root).unwrap();
    for (address, record) in &pack.map {
        let leaf = leaf_of(address, &record.amount_wei);
        let proof = MerkleProof::from_hex(&record.proof).unwrap();
        assert_eq!(
            proof.compute_root(&leaf),
            root,
            "proof for {} does not reproduce the root",
            address
        );
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("claimcraft-it-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

// ============================================================================
// 1. Skip accounting
// ============================================================================

#[test]
fn test_hundred_rows_with_eight_defects() {
    init_logging();

    let mut text = String::from("address,amount\n");
    let mut valid = 0;
    for i in 0..100 {
        if i % 20 == 7 {
            // 5 rows: 39 hex digits
            text.push_str(&format!("0x{:039x},1\n", i + 1));
        } else if i % 33 == 5 {
            // 3 rows: i = 5, 38, 71
            text.push_str(&format!("{},n/a\n", address(i)));
        } else {
            text.push_str(&format!("{},{}\n", address(i), i + 1));
            valid += 1;
        }
    }
    assert_eq!(valid, 92);

    let build = build_bucket("base", &sources("hundred.csv", text), 18).unwrap();
    assert_eq!(build.report.rows, 100);
    assert_eq!(build.pack.count, 92);
    assert_eq!(build.pack.map.len(), 92);
    assert_eq!(build.report.skipped_total(), 8);
    assert_eq!(build.report.skipped.get(&SkipReason::InvalidAddress), Some(&5));
    assert_eq!(build.report.skipped.get(&SkipReason::InvalidAmount), Some(&3));
    assert_all_proofs_verify(&build.pack);
}

#[test]
fn test_localized_amounts_and_delimiters() {
    init_logging();

    let semicolon = format!("Address;Token Amount\n{};\"1.000,5\"\n{};2 000\n", ADDR_A, ADDR_B);
    let tabbed = format!("{}\t0,25\tq3 snapshot\n", ADDR_C);
    let inputs: Vec<Box<dyn InputSource>> = vec![
        Box::new(MemorySource::new("eu.csv", semicolon)),
        Box::new(MemorySource::new("extra.tsv", tabbed)),
    ];

    let build = build_bucket("base", &inputs, 18).unwrap();
    assert_eq!(build.pack.count, 3);
    assert_eq!(build.pack.map[ADDR_A].amount, "1000.5");
    assert_eq!(build.pack.map[ADDR_B].amount, "2000");
    assert_eq!(build.pack.map[ADDR_C].amount, "0.25");
    assert_eq!(build.pack.map[ADDR_C].amount_wei, "250000000000000000");
}

// ============================================================================
// 2. Determinism and aggregation
// ============================================================================

#[test]
fn test_reordered_input_gives_identical_pack() {
    init_logging();

    let rows: Vec<String> = (0..23).map(|i| format!("{},{}.5", address(i), i)).collect();
    let forward = rows.join("\n");
    let mut shuffled = rows.clone();
    shuffled.reverse();
    shuffled.swap(3, 17);
    let shuffled = shuffled
        .into_iter()
        .map(|row| row.to_uppercase().replacen("0X", "0x", 1))
        .collect::<Vec<_>>()
        .join("\r\n");

    let a = build_bucket("base", &sources("a.csv", forward), 18).unwrap();
    let b = build_bucket("base", &sources("b.csv", shuffled), 18).unwrap();
    assert_eq!(a.pack, b.pack);
    assert_eq!(a.pack.to_json_bytes().unwrap(), b.pack.to_json_bytes().unwrap());
}

#[test]
fn test_duplicate_address_amounts_are_summed() {
    init_logging();

    let text = format!(
        "address,amount\n{},3\n{},1\n{},7\n",
        ADDR_A,
        ADDR_B,
        ADDR_A.to_uppercase().replacen("0X", "0x", 1),
    );
    let build = build_bucket("base", &sources("dup.csv", text), 18).unwrap();
    assert_eq!(build.pack.count, 2);
    assert_eq!(build.report.unique_addresses, 2);
    assert_eq!(build.pack.map[ADDR_A].amount, "10");
    assert_eq!(build.pack.map[ADDR_A].amount_wei, "10000000000000000000");
    assert_all_proofs_verify(&build.pack);
}

#[test]
fn test_known_root_vector() {
    let text = format!("{},1\n{},2\n{},0.5\n", ADDR_A, ADDR_B, ADDR_C);
    let build = build_bucket("base", &sources("v.csv", text), 18).unwrap();
    assert_eq!(
        build.pack.root,
        "0x899cbd18a25347162f7b1cbfe86cd98190860c0f9ba1fe2e86d916e054be390f"
    );
    assert_eq!(
        leaf_of(ADDR_A, &build.pack.map[ADDR_A].amount_wei),
        parse_hash("0x169e750aad61e480df8afbda26e8a1eccbd73bea2d5a492cc9948591769bee3b").unwrap()
    );
}

// ============================================================================
// 3-4. Proof validity and tree shapes
// ============================================================================

#[test]
fn test_every_proof_verifies_across_sizes() {
    init_logging();

    for n in [2usize, 3, 4, 7, 8, 9, 31, 64, 65] {
        let text: String = (0..n).map(|i| format!("{},{}\n", address(i), i + 1)).collect();
        let build = build_bucket("base", &sources("n.csv", text), 6).unwrap();
        assert_eq!(build.pack.count, n);
        assert_all_proofs_verify(&build.pack);
        assert_eq!(build.pack.verify().unwrap(), n);
    }
}

#[test]
fn test_five_leaf_bucket_shape() {
    let text: String = (0..5).map(|i| format!("{},1\n", address(i))).collect();
    let build = build_bucket("odd", &sources("odd.csv", text), 18).unwrap();

    let leaves: Vec<Hash32> = build
        .pack
        .map
        .iter()
        .map(|(address, record)| leaf_of(address, &record.amount_wei))
        .collect();
    let tree = MerkleTree::from_leaves(leaves);
    let widths: Vec<usize> = tree.layers().iter().map(Vec::len).collect();
    assert_eq!(widths, vec![5, 3, 2, 1]);
    assert_eq!(hash_to_hex(&tree.root()), build.pack.root);
    assert_all_proofs_verify(&build.pack);

    // The carried-up leaf skips two levels
    let shortest = build.pack.map.values().map(|r| r.proof.len()).min();
    assert_eq!(shortest, Some(1));
}

#[test]
fn test_single_leaf_bucket() {
    let build = build_bucket("one", &sources("one.csv", format!("{},42\n", ADDR_B)), 18).unwrap();
    let record = &build.pack.map[ADDR_B];
    assert!(record.proof.is_empty());
    assert_eq!(
        hash_to_hex(&leaf_of(ADDR_B, &record.amount_wei)),
        build.pack.root
    );
}

#[test]
fn test_empty_bucket_zero_root_and_not_found() {
    let text = "address,amount\nnot-an-address,1\n";
    let build = build_bucket("empty", &sources("empty.csv", text), 18).unwrap();
    assert_eq!(build.pack.root, hash_to_hex(&ZERO_HASH));
    assert_eq!(build.pack.count, 0);

    let store = ProofStore::from_packs(vec![("empty".to_string(), build.pack)]).unwrap();
    assert!(store.get_proof("empty", ADDR_A).unwrap().is_none());
}

#[test]
fn test_excess_precision_is_counted() {
    let text = format!("{},0.1234567\n{},1.5\n", ADDR_A, ADDR_B);
    let build = build_bucket("usdc", &sources("usdc.csv", text), 6).unwrap();
    assert_eq!(build.pack.count, 1);
    assert_eq!(build.pack.map[ADDR_B].amount_wei, "1500000");
    assert_eq!(build.report.skipped.get(&SkipReason::ExcessPrecision), Some(&1));
}

// ============================================================================
// 5. Publishing
// ============================================================================

#[test]
fn test_publish_to_directory_and_reload() {
    init_logging();

    let dir = temp_dir("publish");
    let buckets = vec![
        BucketSpec::new("base", sources("base.csv", format!("{},1\n{},2\n{},3\n", ADDR_A, ADDR_B, ADDR_C))),
        BucketSpec::new("bonus", sources("bonus.csv", format!("{},0.5\n", ADDR_C))),
    ];
    let reports = Distributor::new(18)
        .run(&buckets, &mut DirectorySink::new(&dir))
        .unwrap();
    assert_eq!(reports.len(), 2);

    let roots = RootsIndex::from_json_slice(&std::fs::read(dir.join(ROOTS_FILE)).unwrap()).unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots.get("base").unwrap().root, reports[0].root);

    let store = ProofStore::load_dir(&dir).unwrap();
    for bucket in ["base", "bonus"] {
        assert_eq!(store.pack(bucket).unwrap().verify().unwrap(), roots.get(bucket).unwrap().count);
    }
    let record = store.get_proof("bonus", ADDR_C).unwrap().unwrap();
    assert_eq!(record.amount, "0.5");
    assert!(store.get_proof("bonus", ADDR_A).unwrap().is_none());

    let leftovers: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_rebuild_overwrites_published_pack() {
    let mut sink = MemorySink::new();
    let distributor = Distributor::new(18);

    distributor
        .run(&[BucketSpec::new("base", sources("v1.csv", format!("{},1\n", ADDR_A)))], &mut sink)
        .unwrap();
    let first = DistributionPack::from_json_slice(sink.get("base.json").unwrap()).unwrap();

    distributor
        .run(
            &[BucketSpec::new("base", sources("v2.csv", format!("{},1\n{},1\n", ADDR_A, ADDR_B)))],
            &mut sink,
        )
        .unwrap();
    let second = DistributionPack::from_json_slice(sink.get("base.json").unwrap()).unwrap();

    assert_ne!(first.root, second.root);
    assert_eq!(second.count, 2);
}
