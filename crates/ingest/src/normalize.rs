//! Duplicate merging

use std::collections::BTreeMap;

use claimcraft_core::{checksum_address, Address, TokenAmount};
use tracing::{debug, warn};

use crate::row::{IngestReport, RawEntry, SkipReason};

/// One eligible address with its total amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEntry {
    pub address: Address,
    pub amount: TokenAmount,
}

impl NormalizedEntry {
    /// EIP-55 form of the address.
    pub fn checksummed(&self) -> String {
        checksum_address(&self.address)
    }
}

/// Merge entries sharing an address by exact summation.
///
/// Addresses are compared as bytes, so any letter casing of the same address
/// collapses into one entry. A row whose addition would overflow 256 bits is
/// dropped and recorded as [`SkipReason::AmountOverflow`]; the total
/// accumulated so far is kept. Output is ordered by address bytes.
pub fn normalize(entries: &[RawEntry], report: &mut IngestReport) -> Vec<NormalizedEntry> {
    let mut totals: BTreeMap<Address, TokenAmount> = BTreeMap::new();

    for entry in entries {
        match totals.get_mut(&entry.address) {
            Some(total) => match total.checked_add(&entry.amount) {
                Ok(sum) => {
                    debug!(
                        "Merged duplicate {} from {}:{}",
                        checksum_address(&entry.address),
                        entry.origin.0,
                        entry.origin.1,
                    );
                    *total = sum;
                }
                Err(e) => {
                    warn!(
                        "Dropping {}:{} for {}: {}",
                        entry.origin.0,
                        entry.origin.1,
                        checksum_address(&entry.address),
                        e,
                    );
                    report.reject(SkipReason::AmountOverflow);
                }
            },
            None => {
                totals.insert(entry.address, entry.amount);
            }
        }
    }

    totals
        .into_iter()
        .map(|(address, amount)| NormalizedEntry { address, amount })
        .collect()
}

/// Render entries as `address,amount` CSV with checksummed addresses.
pub fn to_csv(entries: &[NormalizedEntry]) -> String {
    let mut out = String::from("address,amount\n");
    for entry in entries {
        out.push_str(&entry.checksummed());
        out.push(',');
        out.push_str(&entry.amount.to_string());
        out.push('\n');
    }
    out
}
