//! CLI entry point for the fare tracker.
//!
//! Provides subcommands for importing journey-history exports, syncing rows
//! from a remote sheet, logging trips by hand, and reporting PAYG spend
//! against the annual pass.

mod infra;
mod services;

use crate::infra::sheets::client::GoogleSheetsClient;
use crate::services::sheet_source::{SheetRange, SheetSource};
use anyhow::Result;
use clap::{Parser, Subcommand};
use fare_tracker::{
    classify::{classify_manual, classify_rows, parse_row_timestamp},
    config::FareConfig,
    engine::{Verdict, day_summaries, overall_stats},
    fetch::{BasicClient, fetch_bytes},
    output::{export_trips, print_json},
    parser::parse_export,
    store::TripStore,
};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "fare_tracker")]
#[command(about = "Tracks PAYG transit spend against an annual travelcard", long_about = None)]
struct Cli {
    /// Path to the trip store JSON file
    #[arg(long, global = true, default_value = "trips.json")]
    store: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a journey-history CSV export from a file or URL
    Import {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,
    },
    /// Sync journey rows from a Google Sheets range
    Sync {
        /// Spreadsheet id from the sheet URL
        #[arg(long)]
        spreadsheet_id: String,

        /// A1-style range holding the journey columns
        #[arg(long, default_value = "Journeys!A:H")]
        range: String,
    },
    /// Log a journey by hand
    Add {
        /// Date in the export's form, e.g. 14-Mar-2024
        #[arg(long)]
        date: String,

        /// Start time HH:MM; midnight when omitted
        #[arg(long, default_value = "")]
        time: String,

        /// Journey description, e.g. "Bus journey, route 73" or "Angel to Bank"
        #[arg(long)]
        description: String,

        /// Observed charge; overrides the listed fare when higher
        #[arg(long, default_value_t = 0.0)]
        charge: f64,
    },
    /// Delete a trip by id
    Remove {
        #[arg(value_name = "TRIP_ID")]
        id: String,
    },
    /// Summarize daily costs and the pass-vs-PAYG comparison
    Report {
        /// Emit the full report as JSON instead of log lines
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Export the trip collection as CSV
    Export {
        /// CSV file to write
        #[arg(short, long, default_value = "trips.csv")]
        output: String,
    },
}

#[derive(Serialize)]
struct Report<'a> {
    stats: &'a fare_tracker::engine::OverallStats,
    verdict: Option<Verdict>,
    days: &'a [fare_tracker::engine::DaySummary],
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/fare_tracker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fare_tracker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = FareConfig::from_env();
    let store = TripStore::new(&cli.store);

    match cli.command {
        Commands::Import { source } => {
            let bytes = fetcher(&source).await?;
            let text = String::from_utf8(bytes)?;

            let rows = parse_export(&text)?;
            let trips = classify_rows(&rows, "csv", &config)?;
            let classified = trips.len();
            let added = store.merge(trips)?;

            info!(rows = rows.len(), classified, added, "Import complete");
        }
        Commands::Sync {
            spreadsheet_id,
            range,
        } => {
            // Private sheets take an OAuth token; public ones just a key.
            let client: Box<dyn SheetSource> = match std::env::var("GOOGLE_SHEETS_OAUTH_TOKEN") {
                Ok(token) => Box::new(GoogleSheetsClient::with_oauth_token(token)),
                Err(_) => {
                    let api_key = std::env::var("GOOGLE_SHEETS_API_KEY")
                        .expect("GOOGLE_SHEETS_API_KEY or GOOGLE_SHEETS_OAUTH_TOKEN must be set");
                    Box::new(GoogleSheetsClient::with_api_key(api_key))
                }
            };

            let sheet_range = SheetRange {
                spreadsheet_id,
                range,
            };
            let rows = client.fetch_rows(&sheet_range).await?;
            let trips = classify_rows(&rows, "sheet", &config)?;
            let classified = trips.len();
            let added = store.merge(trips)?;

            info!(rows = rows.len(), classified, added, "Sheet sync complete");
        }
        Commands::Add {
            date,
            time,
            description,
            charge,
        } => {
            let timestamp = parse_row_timestamp(&date, &time)?;
            let trip = classify_manual(timestamp, &description, charge, &config);

            info!(
                id = %trip.id,
                fare_type = ?trip.fare_type,
                listed_fare = trip.listed_fare,
                "Trip logged"
            );
            store.merge(vec![trip])?;
        }
        Commands::Remove { id } => {
            if store.remove(&id)? {
                info!(id = %id, "Trip removed");
            } else {
                warn!(id = %id, "No trip with that id");
            }
        }
        Commands::Report { json } => {
            let trips = store.load()?;
            let days = day_summaries(&trips, &config);
            let stats = overall_stats(&days, &config);

            if json {
                print_json(&Report {
                    stats: &stats,
                    verdict: stats.verdict(),
                    days: &days,
                })?;
            } else {
                for day in &days {
                    info!(
                        date = %day.date,
                        trips = day.trips.len(),
                        realized = %format!("{:.2}", day.realized_cost),
                        uncapped = %format!("{:.2}", day.uncapped_cost),
                        capped = day.capped,
                        pass_worth_it = day.pass_worth_it,
                        "Day"
                    );
                }

                info!(
                    travel_days = stats.travel_days,
                    calendar_days = stats.calendar_days,
                    non_travel_days = stats.non_travel_days,
                    capped_days = stats.capped_days,
                    total_trips = stats.total_trips,
                    total_payg = %format!("{:.2}", stats.total_payg),
                    total_uncapped = %format!("{:.2}", stats.total_uncapped),
                    pass_cost = %format!("{:.2}", stats.pass_cost),
                    capped_savings = %format!("{:.2}", stats.capped_savings),
                    non_travel_savings = %format!("{:.2}", stats.non_travel_savings),
                    pass_win_days = stats.pass_win_days,
                    payg_win_days = stats.payg_win_days,
                    "Overall"
                );

                match stats.verdict() {
                    Some(Verdict::PassWins) => info!(
                        savings = %format!("{:.2}", stats.savings),
                        "Annual pass would have been cheaper"
                    ),
                    Some(Verdict::PaygWins) => info!(
                        saved = %format!("{:.2}", -stats.savings),
                        "PAYG is ahead of the pass"
                    ),
                    None => info!("No trips logged; nothing to compare"),
                }
            }
        }
        Commands::Export { output } => {
            let trips = store.load()?;
            export_trips(&output, &trips)?;
            info!(output = %output, count = trips.len(), "Export written");
        }
    }

    Ok(())
}

/// Loads export text from a local file path or fetches it over HTTP.
#[tracing::instrument(fields(source = %source))]
async fn fetcher(source: &String) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http") {
        let client = BasicClient::new();
        fetch_bytes(&client, source).await?
    } else {
        std::fs::read(source)?
    };
    Ok(bytes)
}
