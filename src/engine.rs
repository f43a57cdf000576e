//! Fare aggregation: daily capped costs and the multi-day pass comparison.
//!
//! Everything here is a pure function over a snapshot of the trip
//! collection; summaries are recomputed on demand and never stored.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::FareConfig;
use crate::model::{FareType, Trip};

/// One calendar day's trips with capping and transfer rules applied.
#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// The day's trips, earliest first.
    pub trips: Vec<Trip>,
    /// What the rider actually pays for the day, after the cap.
    pub realized_cost: f64,
    pub uncapped_cost: f64,
    /// Whether the daily cap bound the cost.
    pub capped: bool,
    /// Amount the cap saved, zero when it did not bind.
    pub over_cap_amount: f64,
    /// Whether the day alone cost more than the pass's daily break-even.
    pub pass_worth_it: bool,
}

/// Pass-vs-PAYG outcome over a whole span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    PassWins,
    PaygWins,
}

/// Span-wide statistics across every summarized day plus the calendar days
/// between them with no travel.
#[derive(Debug, Default, Serialize)]
pub struct OverallStats {
    pub total_payg: f64,
    pub total_uncapped: f64,
    pub travel_days: usize,
    pub capped_days: usize,
    /// Inclusive day count from earliest to latest travel day; 0 when the
    /// collection is empty.
    pub calendar_days: i64,
    pub non_travel_days: i64,
    pub total_trips: usize,
    /// What holding the pass would cost over the whole span. Non-travel days
    /// are charged too; a pass does not pause on days at home.
    pub pass_cost: f64,
    /// `pass_cost - total_payg`; positive means the pass would have won.
    pub savings: f64,
    /// Value attributable to capping alone.
    pub capped_savings: f64,
    pub pass_win_days: usize,
    pub payg_win_days: usize,
    /// Pass value wasted on days with no travel.
    pub non_travel_savings: f64,
}

impl OverallStats {
    /// Overall outcome, or `None` for an empty collection where no
    /// comparison is meaningful.
    pub fn verdict(&self) -> Option<Verdict> {
        if self.travel_days == 0 {
            return None;
        }
        Some(if self.savings > 0.0 {
            Verdict::PassWins
        } else {
            Verdict::PaygWins
        })
    }
}

/// Cost of one day's trips before the daily cap.
///
/// Trips must be sorted ascending: hopper eligibility depends on the
/// immediately preceding charged bus boarding. A bus trip within 60 minutes
/// of that boarding is free and does not move the window.
fn uncapped_day_cost(trips: &[Trip], config: &FareConfig) -> f64 {
    let mut cost = 0.0;
    let mut last_bus_boarding: Option<NaiveDateTime> = None;

    for trip in trips {
        match trip.fare_type {
            FareType::Bus => {
                if let Some(boarded) = last_bus_boarding {
                    if (trip.timestamp - boarded).num_minutes() <= 60 {
                        continue; // hopper, free
                    }
                }
                cost += config.bus_rate;
                last_bus_boarding = Some(trip.timestamp);
            }
            FareType::TubePeak | FareType::TubeOffpeak => {
                cost += trip.effective_cost();
            }
        }
    }

    cost
}

/// Groups trips by calendar date and computes each day's summary, most
/// recent day first. Days with no trips get no summary.
pub fn day_summaries(trips: &[Trip], config: &FareConfig) -> Vec<DaySummary> {
    let mut by_day: BTreeMap<NaiveDate, Vec<Trip>> = BTreeMap::new();
    for trip in trips {
        by_day
            .entry(trip.timestamp.date())
            .or_default()
            .push(trip.clone());
    }

    let break_even = config.break_even_daily();
    let mut summaries: Vec<DaySummary> = by_day
        .into_iter()
        .map(|(date, mut day_trips)| {
            day_trips.sort_by_key(|t| t.timestamp);

            let uncapped_cost = uncapped_day_cost(&day_trips, config);
            let realized_cost = uncapped_cost.min(config.daily_cap);

            DaySummary {
                date,
                realized_cost,
                uncapped_cost,
                capped: uncapped_cost > config.daily_cap,
                over_cap_amount: (uncapped_cost - config.daily_cap).max(0.0),
                pass_worth_it: realized_cost > break_even,
                trips: day_trips,
            }
        })
        .collect();

    summaries.reverse();
    summaries
}

/// Rolls a descending day-summary list up into span-wide statistics. Total
/// over any input, including the empty list.
pub fn overall_stats(summaries: &[DaySummary], config: &FareConfig) -> OverallStats {
    let break_even = config.break_even_daily();

    let total_payg: f64 = summaries.iter().map(|d| d.realized_cost).sum();
    let total_uncapped: f64 = summaries
        .iter()
        .map(|d| d.realized_cost + d.over_cap_amount)
        .sum();
    let travel_days = summaries.len();
    let capped_days = summaries.iter().filter(|d| d.capped).count();
    let total_trips = summaries.iter().map(|d| d.trips.len()).sum();

    // List is date-descending: first() is the latest day, last() the earliest.
    let (calendar_days, non_travel_days) = match (summaries.last(), summaries.first()) {
        (Some(earliest), Some(latest)) => {
            let span = (latest.date - earliest.date).num_days() + 1;
            (span, span - travel_days as i64)
        }
        _ => (0, 0),
    };
    let pass_cost = break_even * calendar_days as f64;

    let pass_win_days = summaries.iter().filter(|d| d.pass_worth_it).count();

    OverallStats {
        total_payg,
        total_uncapped,
        travel_days,
        capped_days,
        calendar_days,
        non_travel_days,
        total_trips,
        pass_cost,
        savings: pass_cost - total_payg,
        capped_savings: total_uncapped - total_payg,
        pass_win_days,
        payg_win_days: travel_days - pass_win_days,
        non_travel_savings: non_travel_days as f64 * break_even,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TripOrigin;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn trip(day: u32, hour: u32, minute: u32, fare_type: FareType, listed: f64) -> Trip {
        Trip {
            id: format!("t-{day}-{hour}-{minute}"),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(hour, minute, 0)
                .unwrap(),
            fare_type,
            listed_fare: listed,
            actual_charge: None,
            description: String::new(),
            route: None,
            start_station: None,
            end_station: None,
            origin: TripOrigin::Import,
        }
    }

    fn bus(day: u32, hour: u32, minute: u32) -> Trip {
        trip(day, hour, minute, FareType::Bus, 1.75)
    }

    fn tube_peak(day: u32, hour: u32, minute: u32) -> Trip {
        trip(day, hour, minute, FareType::TubePeak, 3.10)
    }

    #[test]
    fn test_hopper_within_window_is_free() {
        let config = FareConfig::default();
        let summaries = day_summaries(&[bus(14, 8, 0), bus(14, 8, 30)], &config);

        assert_eq!(summaries.len(), 1);
        assert!(approx(summaries[0].uncapped_cost, 1.75));
    }

    #[test]
    fn test_hopper_outside_window_is_charged() {
        let config = FareConfig::default();
        let summaries = day_summaries(&[bus(14, 8, 0), bus(14, 9, 1)], &config);

        assert!(approx(summaries[0].uncapped_cost, 3.50));
    }

    #[test]
    fn test_hopper_window_anchors_on_charged_boarding() {
        // Free transfers do not extend the window: the third bus is measured
        // against the first boarding, 70 minutes back, so it is charged.
        let config = FareConfig::default();
        let summaries = day_summaries(
            &[bus(14, 8, 0), bus(14, 8, 50), bus(14, 9, 10)],
            &config,
        );

        assert!(approx(summaries[0].uncapped_cost, 3.50));
    }

    #[test]
    fn test_mixed_day_under_the_cap() {
        // Thursday: peak tube 3.10 + bus 1.75 + hopper free = 4.85
        let config = FareConfig::default();
        let summaries = day_summaries(
            &[tube_peak(14, 8, 0), bus(14, 8, 15), bus(14, 8, 50)],
            &config,
        );

        let day = &summaries[0];
        assert!(approx(day.uncapped_cost, 4.85));
        assert!(approx(day.realized_cost, 4.85));
        assert!(!day.capped);
        assert!(approx(day.over_cap_amount, 0.0));
    }

    #[test]
    fn test_daily_cap_binds() {
        // Five peak tube trips: 15.50 uncapped, capped to 8.90.
        let config = FareConfig::default();
        let trips: Vec<Trip> = (0..5).map(|i| tube_peak(14, 10 + i, 0)).collect();
        let summaries = day_summaries(&trips, &config);

        let day = &summaries[0];
        assert!(approx(day.uncapped_cost, 15.50));
        assert!(approx(day.realized_cost, 8.90));
        assert!(day.capped);
        assert!(approx(day.over_cap_amount, 6.60));
    }

    #[test]
    fn test_actual_charge_override_feeds_tube_cost() {
        let config = FareConfig::default();
        let mut penalty = tube_peak(14, 8, 0);
        penalty.actual_charge = Some(7.70);

        let summaries = day_summaries(&[penalty], &config);
        assert!(approx(summaries[0].uncapped_cost, 7.70));
    }

    #[test]
    fn test_days_ordered_most_recent_first() {
        let config = FareConfig::default();
        let summaries = day_summaries(&[tube_peak(12, 8, 0), tube_peak(14, 8, 0)], &config);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].date, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        assert_eq!(summaries[1].date, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
    }

    #[test]
    fn test_pass_worth_it_uses_working_day_break_even() {
        let config = FareConfig::default();

        // 6.20 of peak travel is under the 6.88 break-even
        let cheap = day_summaries(&[tube_peak(14, 8, 0), tube_peak(14, 17, 0)], &config);
        assert!(!cheap[0].pass_worth_it);

        // 9.30 uncapped, realized 8.90, over break-even
        let dear = day_summaries(
            &[tube_peak(14, 8, 0), tube_peak(14, 12, 0), tube_peak(14, 17, 0)],
            &config,
        );
        assert!(dear[0].pass_worth_it);
    }

    #[test]
    fn test_overall_stats_span_and_savings() {
        let config = FareConfig::default();
        // Travel on the 12th and 14th; the 13th counts as a non-travel day.
        let summaries = day_summaries(&[tube_peak(12, 8, 0), tube_peak(14, 8, 0)], &config);
        let stats = overall_stats(&summaries, &config);

        assert_eq!(stats.travel_days, 2);
        assert_eq!(stats.calendar_days, 3);
        assert_eq!(stats.non_travel_days, 1);
        assert_eq!(stats.total_trips, 2);
        assert!(approx(stats.total_payg, 6.20));

        let break_even = config.break_even_daily();
        assert!(approx(stats.pass_cost, break_even * 3.0));
        assert!(approx(stats.savings, break_even * 3.0 - 6.20));
        assert!(approx(stats.non_travel_savings, break_even));
        assert_eq!(stats.verdict(), Some(Verdict::PassWins));
    }

    #[test]
    fn test_uncapped_total_reconstruction_is_consistent() {
        let config = FareConfig::default();
        let mut trips: Vec<Trip> = (0..5).map(|i| tube_peak(14, 10 + i, 0)).collect();
        trips.push(tube_peak(12, 8, 0));
        trips.push(bus(13, 9, 0));

        let summaries = day_summaries(&trips, &config);
        let stats = overall_stats(&summaries, &config);

        let direct: f64 = summaries.iter().map(|d| d.uncapped_cost).sum();
        assert!(approx(stats.total_uncapped, direct));
        assert!(approx(stats.capped_savings, direct - stats.total_payg));
    }

    #[test]
    fn test_empty_collection_is_all_zero_with_no_verdict() {
        let config = FareConfig::default();
        let summaries = day_summaries(&[], &config);
        assert!(summaries.is_empty());

        let stats = overall_stats(&summaries, &config);
        assert_eq!(stats.travel_days, 0);
        assert_eq!(stats.calendar_days, 0);
        assert_eq!(stats.non_travel_days, 0);
        assert!(approx(stats.total_payg, 0.0));
        assert!(approx(stats.pass_cost, 0.0));
        assert!(stats.verdict().is_none());
    }

    #[test]
    fn test_determinism_across_runs() {
        let config = FareConfig::default();
        let trips = vec![tube_peak(14, 8, 0), bus(14, 8, 15), tube_peak(12, 17, 0)];

        let first = overall_stats(&day_summaries(&trips, &config), &config);
        let second = overall_stats(&day_summaries(&trips, &config), &config);

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
