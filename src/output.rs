//! Report output and CSV export of the trip collection.

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::model::Trip;

/// Logs a serializable report as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes the whole trip collection as a CSV file, headers included. Any
/// existing file at `path` is replaced.
pub fn export_trips(path: &str, trips: &[Trip]) -> Result<()> {
    debug!(path, count = trips.len(), "Exporting trips to CSV");

    let mut writer = WriterBuilder::new().from_path(Path::new(path))?;
    for trip in trips {
        writer.serialize(trip)?;
    }
    writer.flush()?;

    Ok(())
}
