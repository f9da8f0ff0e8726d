//! # Telemetry Setup
//!
//! Log subscriber and optional Prometheus recorder for the binary.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::EnvFilter;

/// Log filter for a `-v` count. `RUST_LOG`, when set, wins.
pub fn filter_for(verbose: u8) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Install the global log subscriber. Logs go to stderr so stdout stays
/// machine-readable.
pub fn init_logging(verbose: u8, json: bool) {
    let filter = filter_for(verbose);
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Install an in-process Prometheus recorder and describe the engine's
/// counters. Render the handle to read them back.
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    metrics::describe_counter!("travering_triggers_total", "Alerts fired by the geofence engine");
    metrics::describe_counter!(
        "travering_samples_ignored_total",
        "Position samples discarded for missing or invalid coordinates"
    );
    metrics::describe_counter!(
        "travering_channel_failures_total",
        "Failed alert channel attempts"
    );
    metrics::describe_counter!(
        "travering_alerts_delivered_total",
        "Alerts delivered, by delivering channel"
    );

    tracing::debug!("Prometheus recorder installed");
    Ok(handle)
}
