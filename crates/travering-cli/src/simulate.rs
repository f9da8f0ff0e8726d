//! # Simulate Subcommand
//!
//! Replays a track file through the geofence engine and the standard alert
//! chain on the console platform, answering every prompt with the chosen
//! response, and prints a JSON summary on stdout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use travering_core::{format_distance, ManualClock, Settings, Timestamp};
use travering_notify::{DispatchOptions, NotificationDispatcher};
use travering_runtime::{replay, ReplaySummary};
use travering_state::{AckAction, GeofenceStateMachine, TriggerState};

use crate::console::console_platform;
use crate::load_settings;
use crate::track::Track;

/// Arguments for `travering simulate`.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Track file (YAML or JSON).
    #[arg(long)]
    pub track: PathBuf,

    /// How to answer each alert prompt. Unanswered alerts stay triggered.
    #[arg(long, value_enum)]
    pub respond: Option<Response>,

    /// Break every audio channel, forcing the notification fallback.
    #[arg(long)]
    pub fail_audio: bool,

    /// Print every event and channel attempt, not just the outcome.
    #[arg(long)]
    pub full: bool,
}

/// Prompt answer.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    Snooze,
    Stop,
}

impl From<Response> for AckAction {
    fn from(response: Response) -> Self {
        match response {
            Response::Snooze => AckAction::Snooze,
            Response::Stop => AckAction::Stop,
        }
    }
}

/// Condensed outcome of a simulation.
#[derive(Debug, Serialize)]
pub struct SimulationSummary {
    pub steps: usize,
    pub alerts: usize,
    /// Delivering channel per alert; `null` when every channel failed.
    pub delivered_by: Vec<Option<String>>,
    pub final_state: TriggerState,
    pub tracking: bool,
    pub last_distance: Option<String>,
}

impl From<&ReplaySummary> for SimulationSummary {
    fn from(summary: &ReplaySummary) -> Self {
        Self {
            steps: summary.steps,
            alerts: summary.alerts.len(),
            delivered_by: summary
                .alerts
                .iter()
                .map(|report| report.delivered_by.clone())
                .collect(),
            final_state: summary.final_state,
            tracking: summary.tracking,
            last_distance: summary.last_distance_meters.map(format_distance),
        }
    }
}

/// Run `track` to completion.
pub async fn simulate(
    track: &Track,
    settings: &Settings,
    respond: Option<AckAction>,
    fail_audio: bool,
) -> Result<ReplaySummary> {
    let clock = Arc::new(ManualClock::new(track.start().unwrap_or_else(Timestamp::now)));
    let mut machine = GeofenceStateMachine::new(clock.clone());
    machine.set_destination(track.destination);
    machine
        .start_tracking(track.geofence_config(settings)?)
        .context("cannot start tracking")?;

    let dispatcher = NotificationDispatcher::standard(
        console_platform(fail_audio),
        DispatchOptions::from_settings(&settings.alerts),
    );
    let steps = track.steps(settings.feeds.push_min_distance_meters);

    Ok(replay(&mut machine, &clock, &dispatcher, &settings.alerts, steps, respond).await)
}

pub fn run_simulate(
    args: &SimulateArgs,
    config: Option<&Path>,
    metrics: Option<&PrometheusHandle>,
) -> Result<u8> {
    let settings = load_settings(config)?;
    settings.validate().context("invalid settings")?;
    let track = Track::load(&args.track)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let summary = runtime.block_on(simulate(
        &track,
        &settings,
        args.respond.map(AckAction::from),
        args.fail_audio,
    ))?;

    let rendered = if args.full {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string_pretty(&SimulationSummary::from(&summary))?
    };
    println!("{rendered}");

    if let Some(handle) = metrics {
        eprint!("{}", handle.render());
    }
    Ok(0)
}
