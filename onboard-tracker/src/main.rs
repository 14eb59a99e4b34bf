//! onboard-tracker - Command-line front end
//!
//! Opens the SQLite record store, runs one guard operation or analytics view
//! and prints the result as JSON on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use onboard_common::config::{self, TomlConfig};
use onboard_tracker::bucket::IntervalWidth;
use onboard_tracker::{
    AnalyticsAggregator, Checkpoint, PersonRecord, RecordStore, ScanOutcome, SqliteRecordStore,
    StageGuard, VisitorCountOutcome,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for onboard-tracker
#[derive(Parser, Debug)]
#[command(name = "onboard-tracker")]
#[command(about = "Onboarding checkpoint tracker and analytics")]
#[command(version)]
struct Args {
    /// Root folder holding onboard.db
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Database file; overrides the root folder location
    #[arg(long)]
    database: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a person record with every checkpoint open
    Register {
        person_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        group: Option<String>,
    },

    /// Record a checkpoint scan
    Scan {
        /// arrival, hostel, documents or kit
        checkpoint: Checkpoint,
        person_id: String,
        /// Who performed the scan
        #[arg(long = "by")]
        attributor: String,
    },

    /// Overwrite the visitor count (arrival must be recorded)
    Visitors {
        person_id: String,
        #[arg(allow_negative_numbers = true)]
        count: i64,
    },

    /// Journey view of one person
    Journey { person_id: String },

    /// Journey view of everyone
    Journeys,

    /// Completion counts, rates and funnel
    Summary,

    /// First-unmet-checkpoint partition
    Pending,

    /// Time-of-day histograms
    Peak {
        /// Bucket width in minutes (15, 30, 45 or 60)
        #[arg(long)]
        interval: Option<u32>,
    },

    /// Duration statistics between checkpoints
    Timing,

    /// Completions per attributor
    Leaderboard,
}

#[derive(Serialize)]
#[serde(tag = "status")]
enum Lookup {
    NotFound {
        #[serde(rename = "personId")]
        person_id: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", rendered);
    Ok(())
}

/// Rejections are answers; only an unknown person fails the command
fn scan_found(outcome: &ScanOutcome) -> bool {
    !matches!(outcome, ScanOutcome::NotFound { .. })
}

fn visitor_update_found(outcome: &VisitorCountOutcome) -> bool {
    !matches!(outcome, VisitorCountOutcome::NotFound { .. })
}

fn exit_code(found: bool) -> ExitCode {
    if found {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn init_tracing(level: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let (toml_config, config_source) = TomlConfig::load_with_source(args.config.as_deref())
        .context("Failed to load configuration")?;

    // The level comes from the config, so the source is reported afterwards
    init_tracing(&toml_config.logging.level);

    info!(
        "Starting onboard-tracker v{}",
        env!("CARGO_PKG_VERSION")
    );
    config_source.log();

    let default_width = IntervalWidth::from_minutes(toml_config.analytics.default_interval_minutes)
        .context("Invalid analytics.default_interval_minutes")?;

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    let db_path = config::resolve_database_path(args.database.as_deref(), &root_folder, &toml_config);
    info!("Database path: {}", db_path.display());

    let store = Arc::new(
        SqliteRecordStore::open(&db_path)
            .await
            .with_context(|| format!("Failed to open database {}", db_path.display()))?,
    );

    let guard = StageGuard::new(Arc::clone(&store));
    let analytics = AnalyticsAggregator::new(Arc::clone(&store))
        .with_utc_offset_minutes(toml_config.analytics.utc_offset_minutes)
        .context("Invalid analytics.utc_offset_minutes")?;

    match args.command {
        Command::Register {
            person_id,
            name,
            group,
        } => {
            let mut record = PersonRecord::new(person_id, name);
            if let Some(group) = group {
                record = record.with_group(group);
            }
            store.insert(&record).await.context("Failed to register person")?;
            info!(person_id = %record.person_id, "Registered person");
            print_json(&record)?;
        }

        Command::Scan {
            checkpoint,
            person_id,
            attributor,
        } => {
            let outcome = guard
                .apply(&person_id, checkpoint, &attributor)
                .await
                .context("Scan failed")?;
            print_json(&outcome)?;
            return Ok(exit_code(scan_found(&outcome)));
        }

        Command::Visitors { person_id, count } => {
            let outcome = guard
                .set_visitor_count(&person_id, count)
                .await
                .context("Visitor count update failed")?;
            print_json(&outcome)?;
            return Ok(exit_code(visitor_update_found(&outcome)));
        }

        Command::Journey { person_id } => match analytics.journey(&person_id).await? {
            Some(view) => print_json(&view)?,
            None => {
                print_json(&Lookup::NotFound { person_id })?;
                return Ok(ExitCode::FAILURE);
            }
        },

        Command::Journeys => print_json(&analytics.journeys().await?)?,

        Command::Summary => print_json(&analytics.summary().await?)?,

        Command::Pending => print_json(&analytics.pending_counts().await?)?,

        Command::Peak { interval } => {
            let width = interval.unwrap_or(default_width.minutes());
            print_json(&analytics.peak_time_of_day(width).await?)?;
        }

        Command::Timing => print_json(&analytics.stage_timing().await?)?,

        Command::Leaderboard => print_json(&analytics.leaderboard().await?)?,
    }

    Ok(ExitCode::SUCCESS)
}
