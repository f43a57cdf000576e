//! Canonical trip model shared by the importers, the store, and the engine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Fare class of a single trip. Closed set; the pricing rules know nothing
/// else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FareType {
    Bus,
    TubePeak,
    TubeOffpeak,
}

/// Provenance of a trip record, kept for audit and dedup only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripOrigin {
    Manual,
    Import,
}

/// One journey as stored in the collection. Immutable after creation; the
/// only mutation the collection supports is whole-record deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    /// Unique within a collection. Imported rows carry a deterministic
    /// source+date+time+row composite so re-imports dedup; manual entries
    /// get a random UUID.
    pub id: String,
    /// Local start time of the journey.
    pub timestamp: NaiveDateTime,
    pub fare_type: FareType,
    /// Fare assigned from the rate table at classification time.
    pub listed_fare: f64,
    /// Observed charge from the provider ledger, recorded only when it
    /// exceeds the listed fare (penalty fares, incomplete journeys).
    pub actual_charge: Option<f64>,
    pub description: String,
    pub route: Option<String>,
    pub start_station: Option<String>,
    pub end_station: Option<String>,
    pub origin: TripOrigin,
}

impl Trip {
    /// Cost this trip contributes before any daily rules apply: the observed
    /// charge when one was recorded, otherwise the listed fare.
    pub fn effective_cost(&self) -> f64 {
        match self.actual_charge {
            Some(charge) if charge > 0.0 => charge,
            _ => self.listed_fare,
        }
    }
}
