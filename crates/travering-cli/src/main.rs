//! # travering CLI entry point
//!
//! Parses command-line arguments, sets up logging and metrics, and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use travering_cli::check::{run_check_config, CheckConfigArgs};
use travering_cli::distance::{run_distance, DistanceArgs};
use travering_cli::simulate::{run_simulate, SimulateArgs};
use travering_cli::telemetry::{init_logging, init_metrics};

/// TraveRing: a destination alarm driven by a geofence.
///
/// Measures distances, validates settings files, and replays recorded
/// trips through the geofence engine and alert chain.
#[derive(Parser, Debug)]
#[command(name = "travering", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to the settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Record metrics and print them in Prometheus text format on exit.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Great-circle distance between two `lat,lon` points.
    Distance(DistanceArgs),

    /// Load and validate a settings file.
    CheckConfig(CheckConfigArgs),

    /// Replay a recorded track through the engine and alert chain.
    Simulate(SimulateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "travering CLI starting");

    let metrics = if cli.metrics {
        match init_metrics() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("{e:#}");
                None
            }
        }
    } else {
        None
    };

    let result = match &cli.command {
        Commands::Distance(args) => run_distance(args),
        Commands::CheckConfig(args) => run_check_config(args),
        Commands::Simulate(args) => run_simulate(args, cli.config.as_deref(), metrics.as_ref()),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
