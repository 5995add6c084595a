use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use event_booking_valuation::{
    booking::Booking,
    clock::{Clock, FixedClock, SystemClock},
    event::Event,
    report::ReportBuilder,
    settings::ValuationConfig,
    validation::aggregate_strict,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: booking-valuation <input.json> [as-of RFC 3339 timestamp]";

/// One event and its bookings, as fetched from the events API.
#[derive(Debug, Deserialize)]
struct ValuationInput {
    event: Event,
    #[serde(default)]
    bookings: Vec<Booking>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = ValuationConfig::load()?;

    // Initialize logging; stdout carries the report
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting booking valuation");

    let mut args = std::env::args().skip(1);
    let input_path = args.next().context(USAGE)?;
    let clock: Arc<dyn Clock> = match args.next() {
        Some(at) => {
            let at: DateTime<Utc> = at
                .parse()
                .with_context(|| format!("Invalid as-of timestamp {:?}. {}", at, USAGE))?;
            info!("Valuing as of {}", at);
            Arc::new(FixedClock::new(at))
        }
        None => Arc::new(SystemClock),
    };

    let raw = tokio::fs::read_to_string(&input_path)
        .await
        .with_context(|| format!("Failed to read {}", input_path))?;
    let input: ValuationInput =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", input_path))?;

    info!(
        "Loaded event {} with {} bookings",
        input.event.id,
        input.bookings.len()
    );

    let evaluator = config.refund_evaluator();
    evaluator.check_policy(&input.event.refund_policy);

    if config.strict_validation {
        aggregate_strict(&input.event, &input.bookings)
            .context("Strict validation rejected the input")?;
    }

    let builder = ReportBuilder::new(evaluator, clock);
    let report = builder.build(&input.event, &input.bookings);

    info!(
        "📊 Seats - Total: {}, Booked: {}, Available: {}, Cancelled: {}, Booked: {}%",
        report.stats.total_seats,
        report.stats.booked_seats,
        report.stats.available_seats,
        report.stats.cancelled_seats,
        report.stats.percent_booked
    );
    info!(
        "💰 Refund window: {} - exposure if all active bookings cancel: {:.2}",
        report.refund.refund_label,
        report.refund_exposure()
    );
    if report.stats.available_seats < 0 {
        warn!(
            "⚠️ Event {} is over-booked by {} seats",
            report.event_id,
            -report.stats.available_seats
        );
    }

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
