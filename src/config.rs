//! Fare schedule and pass-pricing constants.

use std::env;

/// All monetary knobs the engine depends on. Defaults match the current
/// zone 1–2 rates; each value can be overridden from the environment so a
/// fare revision does not need a rebuild.
#[derive(Debug, Clone)]
pub struct FareConfig {
    pub bus_rate: f64,
    pub tube_peak_rate: f64,
    pub tube_offpeak_rate: f64,
    pub daily_cap: f64,
    pub annual_pass_price: f64,
    /// Pass-eligible working days per year (52 weeks × 5). The break-even
    /// comparison divides by this, not by 365.
    pub working_days_per_year: u32,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            bus_rate: 1.75,
            tube_peak_rate: 3.10,
            tube_offpeak_rate: 3.00,
            daily_cap: 8.90,
            annual_pass_price: 1788.0,
            working_days_per_year: 260,
        }
    }
}

impl FareConfig {
    /// Builds the config from `FARE_*` environment variables, falling back
    /// to the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bus_rate: env_f64("FARE_BUS_RATE", defaults.bus_rate),
            tube_peak_rate: env_f64("FARE_TUBE_PEAK_RATE", defaults.tube_peak_rate),
            tube_offpeak_rate: env_f64("FARE_TUBE_OFFPEAK_RATE", defaults.tube_offpeak_rate),
            daily_cap: env_f64("FARE_DAILY_CAP", defaults.daily_cap),
            annual_pass_price: env_f64("FARE_ANNUAL_PASS_PRICE", defaults.annual_pass_price),
            working_days_per_year: env::var("FARE_WORKING_DAYS_PER_YEAR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.working_days_per_year),
        }
    }

    /// Daily break-even price of the annual pass, per working day.
    pub fn break_even_daily(&self) -> f64 {
        self.annual_pass_price / self.working_days_per_year as f64
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
