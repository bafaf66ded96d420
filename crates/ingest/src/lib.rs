//! ClaimCraft Eligibility Ingestion
//!
//! Turns raw delimited eligibility files into one aggregated entry per
//! address.
//!
//! ## Pipeline
//!
//! - **InputSource**: where the bytes come from (file on disk, in-memory buffer)
//! - **parse_table**: delimiter/header detection and per-row validation;
//!   every row ends as either a [`RawEntry`] or a [`SkipReason`]
//! - **normalize**: merges case-variant duplicates by exact decimal summation
//!
//! Malformed rows never fail a run. They are tallied in an [`IngestReport`]
//! and logged at debug level. Only IO failures surface as [`IngestError`].

mod detect;
mod normalize;
mod row;
mod source;

pub use detect::{ColumnLayout, Delimiter};
pub use normalize::{normalize, to_csv, NormalizedEntry};
pub use row::{normalize_amount_text, parse_table, IngestReport, ParsedTable, RawEntry, SkipReason};
pub use source::{FileSource, InputSource, MemorySource};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read input {name}: {source}")]
    ReadError {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// Read and parse every source, concatenating their rows.
///
/// Each source gets its own delimiter and header detection.
pub fn ingest(sources: &[Box<dyn InputSource>]) -> Result<ParsedTable> {
    let mut combined = ParsedTable::default();
    for source in sources {
        let bytes = source.read()?;
        let table = parse_table(source.name(), &bytes);
        info!(
            "Ingested {}: {} rows, {} accepted, {} skipped",
            source.name(),
            table.report.rows,
            table.report.accepted,
            table.report.skipped_total(),
        );
        if table.report.all_skipped() {
            warn!(
                "Every row of {} was skipped; check its delimiter and columns",
                source.name(),
            );
        }
        combined.extend(table);
    }
    Ok(combined)
}
