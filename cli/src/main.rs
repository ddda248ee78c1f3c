//! `rxscan` — operational commands wrapping the three scanning jobs
//! (§6 "Operational commands"): `ingest`, `evaluate`, `scan-coverage`.
//!
//! Each subcommand follows the teacher's service `main.rs` shape: load
//! `.env`, init tracing, load `Settings`, connect a pool, health-check it,
//! build the repositories/service the command needs, run it, print the
//! job summary as pretty JSON.

mod commands;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rxscan_core::config::Settings;
use rxscan_core::infrastructure::database::{create_pool_with_options, DatabaseService};
use rxscan_core::infrastructure::logging;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "rxscan", version, about = "Pharmacy claims ingestion, trigger evaluation, and coverage scanning")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest a claims export file for a pharmacy (§4.1).
    Ingest {
        /// Pharmacy UUID.
        pharmacy_id: Uuid,
        /// Path to the CSV/TSV claims export.
        path: std::path::PathBuf,
    },
    /// Run the trigger evaluator for a pharmacy (§4.2).
    Evaluate {
        /// Pharmacy UUID.
        pharmacy_id: Uuid,
        /// Days of prescription history to scan (default 90).
        #[arg(long)]
        lookback_days: Option<i64>,
    },
    /// Run the process-wide coverage scan across all triggers (§4.3).
    ScanCoverage {
        #[arg(long)]
        min_claims: Option<i64>,
        #[arg(long)]
        days_back: Option<i64>,
        #[arg(long)]
        min_margin: Option<f64>,
        #[arg(long)]
        dme_min_margin: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init_from_settings(&settings.logging);

    let cli = Cli::parse();

    info!("connecting to database...");
    let pool = match create_pool_with_options(&settings.database.url, settings.database.max_connections, settings.database.min_connections).await {
        Ok(p) => p,
        Err(e) => {
            error!("failed to connect to database: {e}");
            return ExitCode::FAILURE;
        }
    };
    let database_service = Arc::new(DatabaseService::new(pool));
    if let Err(e) = database_service.health_check().await {
        error!("database health check failed: {e}");
        return ExitCode::FAILURE;
    }
    info!("database health check passed");

    let result = match cli.command {
        Command::Ingest { pharmacy_id, path } => commands::ingest::run(database_service, pharmacy_id, &path).await,
        Command::Evaluate { pharmacy_id, lookback_days } => {
            commands::evaluate::run(database_service, pharmacy_id, lookback_days.unwrap_or(settings.scan.lookback_days)).await
        }
        Command::ScanCoverage { min_claims, days_back, min_margin, dme_min_margin } => {
            commands::scan_coverage::run(database_service, &settings.scan, min_claims, days_back, min_margin, dme_min_margin).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("job failed: {e}");
            ExitCode::FAILURE
        }
    }
}
