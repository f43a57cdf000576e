//! Trip collection persistence.
//!
//! The whole collection lives in one JSON document and is replaced
//! wholesale on every write, so a reader never sees a half-merged state.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::model::Trip;

pub struct TripStore {
    path: PathBuf,
}

impl TripStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the collection. A missing file is an empty collection, not an
    /// error.
    pub fn load(&self) -> Result<Vec<Trip>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("reading trip store {}", self.path.display()))?;
        let trips: Vec<Trip> = serde_json::from_str(&content)
            .with_context(|| format!("decoding trip store {}", self.path.display()))?;
        Ok(trips)
    }

    /// Replaces the stored collection.
    pub fn save(&self, trips: &[Trip]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let body = serde_json::to_vec_pretty(trips)?;
        fs::write(&self.path, body)
            .with_context(|| format!("writing trip store {}", self.path.display()))?;
        debug!(path = %self.path.display(), count = trips.len(), "Trip store written");
        Ok(())
    }

    /// Merges incoming trips into the stored collection, dropping any whose
    /// id is already present, and persists the result. Returns how many
    /// trips were actually added.
    pub fn merge(&self, incoming: Vec<Trip>) -> Result<usize> {
        let mut trips = self.load()?;
        let added = merge_trips(&mut trips, incoming);
        self.save(&trips)?;
        Ok(added)
    }

    /// Deletes the trip with `id` and persists. Returns whether a record was
    /// removed.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut trips = self.load()?;
        let before = trips.len();
        trips.retain(|t| t.id != id);
        if trips.len() == before {
            return Ok(false);
        }
        self.save(&trips)?;
        Ok(true)
    }
}

/// Id-based idempotent merge. Incoming records whose id already exists (in
/// the collection or earlier in the same batch) are discarded silently.
pub fn merge_trips(existing: &mut Vec<Trip>, incoming: Vec<Trip>) -> usize {
    let mut known: HashSet<String> = existing.iter().map(|t| t.id.clone()).collect();
    let mut added = 0;

    for trip in incoming {
        if !known.insert(trip.id.clone()) {
            continue;
        }
        existing.push(trip);
        added += 1;
    }

    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FareType, TripOrigin};
    use chrono::NaiveDate;
    use std::env;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn trip(id: &str) -> Trip {
        Trip {
            id: id.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 14)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            fare_type: FareType::Bus,
            listed_fare: 1.75,
            actual_charge: None,
            description: "Bus journey, route 73".to_string(),
            route: Some("73".to_string()),
            start_station: None,
            end_station: None,
            origin: TripOrigin::Import,
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let store = TripStore::new(temp_path("fare_tracker_test_missing.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let path = temp_path("fare_tracker_test_roundtrip.json");
        let _ = fs::remove_file(&path);

        let store = TripStore::new(&path);
        store.save(&[trip("a"), trip("b")]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "a");
        assert_eq!(loaded[0].fare_type, FareType::Bus);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_merge_adds_only_unknown_ids() {
        let mut existing = vec![trip("a"), trip("b")];
        // two known ids, one new, plus a duplicate within the batch
        let added = merge_trips(
            &mut existing,
            vec![trip("a"), trip("b"), trip("c"), trip("c")],
        );

        assert_eq!(added, 1);
        assert_eq!(existing.len(), 3);
    }

    #[test]
    fn test_store_merge_is_idempotent() {
        let path = temp_path("fare_tracker_test_merge.json");
        let _ = fs::remove_file(&path);

        let store = TripStore::new(&path);
        assert_eq!(store.merge(vec![trip("a"), trip("b")]).unwrap(), 2);
        assert_eq!(store.merge(vec![trip("a"), trip("b")]).unwrap(), 0);
        assert_eq!(store.load().unwrap().len(), 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_remove_by_id() {
        let path = temp_path("fare_tracker_test_remove.json");
        let _ = fs::remove_file(&path);

        let store = TripStore::new(&path);
        store.save(&[trip("a"), trip("b")]).unwrap();

        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert_eq!(store.load().unwrap().len(), 1);

        fs::remove_file(&path).unwrap();
    }
}
