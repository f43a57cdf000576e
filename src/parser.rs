//! Text parser for the provider's CSV journey-history export.
//!
//! Exports carry preamble lines (card name, period totals) ahead of the real
//! header, so data starts after the line containing both `Date` and
//! `Journey/Action`. Field splitting honours double-quote-enclosed commas
//! and doubled-quote escapes.

use anyhow::Result;
use csv::ReaderBuilder;

use crate::classify::RawRow;

/// Splits a full export text into raw rows ready for classification.
///
/// When no header line is found the whole text is treated as data; the
/// classifier's own skip rules then drop anything that is not a journey row.
pub fn parse_export(text: &str) -> Result<Vec<RawRow>> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

    let start = lines
        .iter()
        .position(|l| l.contains("Date") && l.contains("Journey/Action"))
        .map(|i| i + 1)
        .unwrap_or(0);

    let data = lines[start..].join("\n");

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(RawRow {
            fields: record.iter().map(|f| f.trim().to_string()).collect(),
        });
    }

    Ok(rows)
}
