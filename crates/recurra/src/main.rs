use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, TimeDelta, Utc};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use recurra::config::Config;
use recurra::state::Engine;
use recurra_core::calendar::{validate_event, EventRecord, EventTemplate};
use recurra_core::recurrence::generate;
use recurra_core::storage::TimeWindow;

/// Recurra - Expand recurring calendar events into concrete occurrences
#[derive(Parser, Debug)]
#[command(name = "recurra")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Expand a recurring event stored as JSON and print its occurrences
    Expand {
        /// Path to the event JSON file
        #[arg(long)]
        event: PathBuf,

        /// First day of the window (inclusive)
        #[arg(long)]
        from: NaiveDate,

        /// Day the window ends on (exclusive)
        #[arg(long)]
        to: NaiveDate,
    },

    /// Seed an in-memory calendar and print a range query
    Demo {
        /// Day the demo data is centered on (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Number of days to query, starting three days before `date`
        #[arg(long, default_value = "7")]
        days: i64,

        /// Return recurring parents unexpanded
        #[arg(long)]
        collapsed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recurra=debug,recurra_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();

    match cli.command {
        Commands::Expand { event, from, to } => expand(&config, event, from, to)?,
        Commands::Demo {
            date,
            days,
            collapsed,
        } => demo(&config, date, days, collapsed).await?,
    }

    Ok(())
}

/// Expands one event without touching the cache or any repository.
fn expand(config: &Config, path: PathBuf, from: NaiveDate, to: NaiveDate) -> Result<()> {
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let record: EventRecord = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse event from {}", path.display()))?;
    validate_event(&record).context("invalid event")?;

    let Some(rule) = record.recurrence_rule()? else {
        bail!("event {} does not recur", record.id);
    };
    let window = TimeWindow::from_dates(from, to)?;
    let template = EventTemplate::from_record(&record, Some(rule));

    let occurrences = generate(&template, &window, &config.limits());
    tracing::debug!(event_id = %record.id, count = occurrences.len(), "Expanded event");

    println!("{}", serde_json::to_string_pretty(&occurrences)?);
    Ok(())
}

/// Dates queried by `demo`: from three days before `center`, `days` long.
///
/// Returns `None` when either end falls outside the supported date range.
fn demo_range(center: NaiveDate, days: i64) -> Option<(NaiveDate, NaiveDate)> {
    let start = center.checked_sub_signed(TimeDelta::days(3))?;
    let end = start.checked_add_signed(TimeDelta::try_days(days.max(0))?)?;
    Some((start, end))
}

async fn demo(config: &Config, date: Option<NaiveDate>, days: i64, collapsed: bool) -> Result<()> {
    let center = date.unwrap_or_else(|| Utc::now().date_naive());
    let Some((start, end)) = demo_range(center, days) else {
        bail!("--days {days} is out of range around {center}");
    };
    let window = TimeWindow::from_dates(start, end)?;

    let user_id = Uuid::new_v4();
    let engine = Engine::with_demo_data(config, user_id, center).await?;
    let result = engine
        .queries
        .get_events_in_range(user_id, window, !collapsed)
        .await?;

    tracing::info!(
        events = result.events.len(),
        holidays = result.holidays.len(),
        "Demo range query"
    );
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
