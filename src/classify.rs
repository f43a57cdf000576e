//! Row classification: turns one raw journey-history row into a canonical
//! [`Trip`], or skips it.
//!
//! Both ingestion paths (export-file text and synced sheet rows) feed the
//! same [`RawRow`] shape through here, so the skip/parse rules live in one
//! place.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use uuid::Uuid;

use crate::config::FareConfig;
use crate::model::{FareType, Trip, TripOrigin};

/// One row in the provider's column order: date, start time, end time
/// (unused), journey/action, charge. Columns past the fifth are ignored.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub fields: Vec<String>,
}

impl RawRow {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The date column was present but not `d-Mon-yyyy` with a known month
    /// abbreviation. A broken source rather than an expected gap, so it is
    /// surfaced instead of skipped.
    #[error("malformed date field: {0:?}")]
    MalformedDate(String),
}

static ROUTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)route\s+(\S+)").unwrap());
static STATIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(.+?)\s+to\s+(.+)").unwrap());

/// Month abbreviations as the export prints them. Exact case match.
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn month_number(abbr: &str) -> Option<u32> {
    MONTHS.iter().position(|m| *m == abbr).map(|i| i as u32 + 1)
}

/// Parses the export's `14-Mar-2024` date plus an optional `8:05` start
/// time. A time field without a `:` separator (or with unparseable parts)
/// means midnight.
pub fn parse_row_timestamp(date: &str, time: &str) -> Result<NaiveDateTime, ClassifyError> {
    let malformed = || ClassifyError::MalformedDate(date.to_string());

    let mut parts = date.splitn(3, '-');
    let day: u32 = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .ok_or_else(malformed)?;
    let month = parts
        .next()
        .and_then(month_number)
        .ok_or_else(malformed)?;
    let year: i32 = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .ok_or_else(malformed)?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(malformed)?;
    Ok(date.and_time(parse_start_time(time)))
}

fn parse_start_time(time: &str) -> NaiveTime {
    let Some((hour, minute)) = time.split_once(':') else {
        return NaiveTime::MIN;
    };
    let hour = hour.trim().parse().unwrap_or(0);
    let minute = minute.trim().parse().unwrap_or(0);
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Peak pricing window test: weekdays 06:30–09:30 and 16:00–19:00, both
/// bounds inclusive. Weekends are always off-peak.
pub fn is_peak_time(ts: NaiveDateTime) -> bool {
    use chrono::{Datelike, Timelike, Weekday};

    if matches!(ts.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    let minute_of_day = ts.hour() * 60 + ts.minute();
    (390..=570).contains(&minute_of_day) || (960..=1140).contains(&minute_of_day)
}

/// Fare classification shared by imported rows and manual entries: the fare
/// type from the description text, the listed fare from the rate table, and
/// whatever route or station metadata the description yields.
fn classify_action(
    action: &str,
    timestamp: NaiveDateTime,
    config: &FareConfig,
) -> (FareType, f64, Option<String>, Option<String>, Option<String>) {
    if action.to_lowercase().contains("bus journey") {
        let route = ROUTE_RE.captures(action).map(|c| c[1].to_string());
        return (FareType::Bus, config.bus_rate, route, None, None);
    }

    let (fare_type, listed_fare) = if is_peak_time(timestamp) {
        (FareType::TubePeak, config.tube_peak_rate)
    } else {
        (FareType::TubeOffpeak, config.tube_offpeak_rate)
    };
    let (start, end) = match STATIONS_RE.captures(action) {
        Some(c) => (Some(c[1].to_string()), Some(c[2].to_string())),
        None => (None, None),
    };
    (fare_type, listed_fare, None, start, end)
}

/// Maps one raw row to a canonical trip.
///
/// Returns `Ok(None)` for rows the import policy filters out: fewer than
/// five fields, a missing date or description, or the repeated `Date`
/// header. A date that is present but unparseable is an error, not a skip.
pub fn classify_row(
    row: &RawRow,
    index: usize,
    source_tag: &str,
    config: &FareConfig,
) -> Result<Option<Trip>, ClassifyError> {
    if row.fields.len() < 5 {
        return Ok(None);
    }
    let date = row.fields[0].trim();
    let time = row.fields[1].trim();
    let action = row.fields[3].trim();
    let charge = row.fields[4].trim();

    if date.is_empty() || action.is_empty() || date == "Date" {
        return Ok(None);
    }

    let timestamp = parse_row_timestamp(date, time)?;
    let observed: f64 = charge.parse().unwrap_or(0.0);

    let (fare_type, listed_fare, route, start_station, end_station) =
        classify_action(action, timestamp, config);

    let actual_charge = (observed > 0.0 && observed > listed_fare).then_some(observed);

    Ok(Some(Trip {
        id: format!("{source_tag}-{date}-{time}-{index}"),
        timestamp,
        fare_type,
        listed_fare,
        actual_charge,
        description: action.to_string(),
        route,
        start_station,
        end_station,
        origin: TripOrigin::Import,
    }))
}

/// Classifies a batch of rows, keeping each row's index in its id so that
/// re-importing the same file or sheet produces the same ids.
pub fn classify_rows(
    rows: &[RawRow],
    source_tag: &str,
    config: &FareConfig,
) -> Result<Vec<Trip>, ClassifyError> {
    let mut trips = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        if let Some(trip) = classify_row(row, index, source_tag, config)? {
            trips.push(trip);
        }
    }
    Ok(trips)
}

/// Builds a trip from a manually logged journey. Same fare classification as
/// an imported row, but with a random id and `Manual` provenance.
pub fn classify_manual(
    timestamp: NaiveDateTime,
    description: &str,
    charge: f64,
    config: &FareConfig,
) -> Trip {
    let (fare_type, listed_fare, route, start_station, end_station) =
        classify_action(description, timestamp, config);

    let actual_charge = (charge > 0.0 && charge > listed_fare).then_some(charge);

    Trip {
        id: Uuid::new_v4().to_string(),
        timestamp,
        fare_type,
        listed_fare,
        actual_charge,
        description: description.to_string(),
        route,
        start_station,
        end_station,
        origin: TripOrigin::Manual,
    }
}
