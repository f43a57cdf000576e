//! Trait and types for remote tabular journey sources.

use anyhow::Result;
use fare_tracker::classify::RawRow;

/// Addresses one rectangular range of a remote spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetRange {
    pub spreadsheet_id: String,
    /// A1-style range, e.g. `Journeys!A:H`.
    pub range: String,
}

/// Abstraction over a remote tabular source of journey rows (e.g. a Google
/// Sheet mirroring the provider export).
#[async_trait::async_trait]
pub trait SheetSource {
    /// Returns every row of the range in sheet order, including any header
    /// rows; the classifier filters those out.
    async fn fetch_rows(&self, range: &SheetRange) -> Result<Vec<RawRow>>;
}
