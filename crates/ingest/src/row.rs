//! Row parsing and skip accounting

use std::collections::BTreeMap;
use std::fmt;

use claimcraft_core::{parse_address, Address, CoreError, TokenAmount};
use tracing::debug;

use crate::detect::{ColumnLayout, Delimiter};

/// Why a row was left out of the distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    /// Fewer fields than the layout needs, or an empty address/amount cell
    TooFewFields,
    InvalidAddress,
    /// Not an unsigned decimal after separator normalization
    InvalidAmount,
    /// Amount (or an address's running total) exceeds 2^256 - 1
    AmountOverflow,
    /// More significant fractional digits than the token supports
    ExcessPrecision,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::TooFewFields => "too few fields",
            Self::InvalidAddress => "invalid address",
            Self::InvalidAmount => "invalid amount",
            Self::AmountOverflow => "amount overflow",
            Self::ExcessPrecision => "excess precision",
        };
        f.write_str(label)
    }
}

/// One valid eligibility row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub address: Address,
    pub amount: TokenAmount,
    /// Input name and 1-based line number, for diagnostics
    pub origin: (String, usize),
}

/// Row counters for one or more tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Non-blank data rows seen (header rows excluded)
    pub rows: usize,
    /// Rows that produced a [`RawEntry`]
    pub accepted: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl IngestReport {
    pub fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    /// Move one previously accepted item to the skipped tally.
    pub fn reject(&mut self, reason: SkipReason) {
        self.accepted = self.accepted.saturating_sub(1);
        self.record_skip(reason);
    }

    /// Rows were read but none produced an entry, which usually means the
    /// wrong delimiter or columns were picked.
    pub fn all_skipped(&self) -> bool {
        self.rows > 0 && self.accepted == 0
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    pub fn merge(&mut self, other: &IngestReport) {
        self.rows += other.rows;
        self.accepted += other.accepted;
        for (reason, count) in &other.skipped {
            *self.skipped.entry(*reason).or_insert(0) += count;
        }
    }
}

/// Result of parsing one or more tables.
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub entries: Vec<RawEntry>,
    pub report: IngestReport,
}

impl ParsedTable {
    pub fn extend(&mut self, other: ParsedTable) {
        self.report.merge(&other.report);
        self.entries.extend(other.entries);
    }
}

/// Trim whitespace and one layer of matching surrounding quotes.
fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

fn split_fields(line: &str, delimiter: Delimiter) -> Vec<String> {
    line.split(delimiter.as_char()).map(clean_field).collect()
}

/// Bring a human-typed amount into `digits[.digits]` form.
///
/// Spaces (including no-break spaces) are grouping and dropped. With both
/// `,` and `.` present the right-most one is the decimal point. A single `,`
/// is a decimal comma; repeated `,` or repeated `.` are grouping.
pub fn normalize_amount_text(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let commas = compact.matches(',').count();
    let dots = compact.matches('.').count();

    match (compact.rfind(','), compact.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => compact.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => compact.replace(',', ""),
        (Some(_), None) if commas > 1 => compact.replace(',', ""),
        (Some(_), None) => compact.replace(',', "."),
        (None, Some(_)) if dots > 1 => compact.replace('.', ""),
        _ => compact,
    }
}

fn parse_row(fields: &[String], layout: &ColumnLayout) -> Result<(Address, TokenAmount), SkipReason> {
    if fields.len() < layout.min_fields().max(2) {
        return Err(SkipReason::TooFewFields);
    }
    let address_text = &fields[layout.address];
    let amount_text = &fields[layout.amount];
    if address_text.is_empty() || amount_text.is_empty() {
        return Err(SkipReason::TooFewFields);
    }

    let address = parse_address(address_text).map_err(|_| SkipReason::InvalidAddress)?;
    let amount = normalize_amount_text(amount_text)
        .parse::<TokenAmount>()
        .map_err(|e| match e {
            CoreError::AmountOverflow => SkipReason::AmountOverflow,
            _ => SkipReason::InvalidAmount,
        })?;
    Ok((address, amount))
}

/// Parse one delimited table.
///
/// The delimiter and header are detected from the first non-blank line.
pub fn parse_table(source: &str, bytes: &[u8]) -> ParsedTable {
    let text = String::from_utf8_lossy(bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let mut table = ParsedTable::default();
    let Some((first_index, first_line)) = lines.next() else {
        return table;
    };

    let delimiter = Delimiter::detect(first_line);
    let first_fields = split_fields(first_line, delimiter);
    let layout = ColumnLayout::detect(&first_fields);
    debug!(
        "{}: delimiter {:?}, header {}, address column {}, amount column {}",
        source, delimiter, layout.has_header, layout.address, layout.amount,
    );

    let first = (!layout.has_header).then_some((first_index, first_fields));
    let rest = lines.map(|(index, line)| (index, split_fields(line, delimiter)));

    for (index, fields) in first.into_iter().chain(rest) {
        table.report.rows += 1;
        match parse_row(&fields, &layout) {
            Ok((address, amount)) => {
                table.report.accepted += 1;
                table.entries.push(RawEntry {
                    address,
                    amount,
                    origin: (source.to_string(), index + 1),
                });
            }
            Err(reason) => {
                debug!("Skipping {}:{} ({}): {:?}", source, index + 1, reason, fields);
                table.report.record_skip(reason);
            }
        }
    }

    table
}
