//! # Geofence Runtime
//!
//! ```text
//!  PollingFeed ──┐
//!                ├──► mpsc<Input> ──► consumer (owns GeofenceStateMachine)
//!  PushFeed ─────┤                          │            │
//!  RuntimeHandle ┤                          │            ├──► broadcast<RuntimeEvent>
//!  dispatch task ┘◄── spawn(fire) ◄─────────┘            └──► watch<Option<f64>>
//! ```
//!
//! ## Invariants
//!
//! - Only the consumer touches the machine; inputs apply in arrival order.
//! - A dispatch report is published only while its ticket is current. A
//!   report for an alert superseded by stop, destination change or a
//!   newer trigger is dropped.
//! - Only [`RuntimeHandle`] holds a strong input sender. Feeds and dispatch
//!   tasks hold weak ones, so dropping the handle stops the runtime the same
//!   way [`RuntimeHandle::shutdown`] does.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use travering_core::settings::AlertSettings;
use travering_core::{Destination, GeofenceConfig};
use travering_notify::{Alert, DispatchReport, NotificationDispatcher};
use travering_state::{AckAction, AlertTicket, FeedSource, GeofenceStateMachine};

use crate::command::{Command, RuntimeEvent};
use crate::error::RuntimeError;
use crate::feed::{FeedMessage, PositionFeed};

const INPUT_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 64;

enum Input {
    Feed(FeedSource, FeedMessage),
    Command(Command),
    Dispatched(DispatchReport),
    Shutdown,
}

/// Builder for the consumer task and its feeds.
pub struct GeofenceRuntime {
    machine: GeofenceStateMachine,
    dispatcher: Arc<NotificationDispatcher>,
    alerts: AlertSettings,
    feeds: Vec<Box<dyn PositionFeed>>,
}

impl GeofenceRuntime {
    pub fn new(
        machine: GeofenceStateMachine,
        dispatcher: NotificationDispatcher,
        alerts: AlertSettings,
    ) -> Self {
        Self {
            machine,
            dispatcher: Arc::new(dispatcher),
            alerts,
            feeds: Vec::new(),
        }
    }

    /// Add a position feed. Any number may be attached.
    pub fn with_feed(mut self, feed: impl PositionFeed + 'static) -> Self {
        self.feeds.push(Box::new(feed));
        self
    }

    /// Start the feeds and the consumer.
    pub fn spawn(self) -> RuntimeHandle {
        let (input_tx, input_rx) = mpsc::channel(INPUT_CAPACITY);
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (distance_tx, distance_rx) = watch::channel(self.machine.distance_meters());

        let producers = self
            .feeds
            .into_iter()
            .map(|feed| tokio::spawn(pump(feed, input_tx.downgrade())))
            .collect();

        let consumer = Consumer {
            machine: self.machine,
            dispatcher: self.dispatcher,
            alerts: self.alerts,
            input_tx: input_tx.downgrade(),
            events: events_tx.clone(),
            distance: distance_tx,
            producers,
        };
        let task = tokio::spawn(consumer.run(input_rx));

        RuntimeHandle {
            input: input_tx,
            events: events_tx,
            distance: distance_rx,
            task,
        }
    }
}

async fn pump(mut feed: Box<dyn PositionFeed>, tx: mpsc::WeakSender<Input>) {
    let source = feed.source();
    while let Some(message) = feed.next().await {
        let Some(tx) = tx.upgrade() else {
            return;
        };
        if tx.send(Input::Feed(source, message)).await.is_err() {
            return;
        }
    }
    tracing::debug!(%source, "position feed exhausted");
}

struct Consumer {
    machine: GeofenceStateMachine,
    dispatcher: Arc<NotificationDispatcher>,
    alerts: AlertSettings,
    input_tx: mpsc::WeakSender<Input>,
    events: broadcast::Sender<RuntimeEvent>,
    distance: watch::Sender<Option<f64>>,
    producers: Vec<JoinHandle<()>>,
}

impl Consumer {
    async fn run(mut self, mut rx: mpsc::Receiver<Input>) -> GeofenceStateMachine {
        // A failed preload is logged by the dispatcher; reload covers it.
        let _ = self.dispatcher.prepare().await;
        self.publish();

        while let Some(input) = rx.recv().await {
            match input {
                Input::Feed(source, message) => self.on_feed(source, message),
                Input::Command(command) => self.on_command(command),
                Input::Dispatched(report) => self.on_dispatched(report),
                Input::Shutdown => break,
            }
            self.publish();
        }

        for producer in &self.producers {
            producer.abort();
        }
        self.dispatcher.shutdown().await;
        tracing::info!("geofence runtime stopped");
        self.machine
    }

    fn on_feed(&mut self, source: FeedSource, message: FeedMessage) {
        match message {
            FeedMessage::Sample(sample) => {
                if let Some(trigger) = self.machine.on_position(sample, source) {
                    let alert = Alert::from_trigger(&trigger, &self.alerts);
                    let dispatcher = Arc::clone(&self.dispatcher);
                    let tx = self.input_tx.clone();
                    tokio::spawn(async move {
                        let report = dispatcher.fire(alert).await;
                        if let Some(tx) = tx.upgrade() {
                            let _ = tx.send(Input::Dispatched(report)).await;
                        }
                    });
                }
            }
            FeedMessage::Fault(fault) => self.machine.report_source_error(fault),
        }
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::SetDestination(destination) => self.machine.set_destination(destination),
            Command::ClearDestination => self.machine.clear_destination(),
            Command::StartTracking { config, reply } => {
                let _ = reply.send(self.machine.start_tracking(config));
            }
            Command::StopTracking => self.machine.stop_tracking(),
            Command::Acknowledge { ticket, action } => {
                if !self.machine.acknowledge_ticket(ticket, action) {
                    tracing::debug!(%ticket, ?action, "acknowledgment for stale alert dropped");
                }
            }
        }
    }

    fn on_dispatched(&mut self, report: DispatchReport) {
        if !self.machine.is_current(report.ticket) {
            tracing::debug!(ticket = %report.ticket, "alert superseded before its prompt was shown");
            return;
        }
        let _ = self.events.send(RuntimeEvent::Alert { report });
    }

    fn publish(&mut self) {
        for event in self.machine.drain_events() {
            // No subscribers is not an error.
            let _ = self.events.send(RuntimeEvent::State { event });
        }
        let latest = self.machine.distance_meters();
        self.distance.send_if_modified(|current| {
            if *current == latest {
                return false;
            }
            *current = latest;
            true
        });
    }
}

/// Control surface for a running [`GeofenceRuntime`].
///
/// Dropping the last handle without calling [`shutdown`](Self::shutdown)
/// still stops the feeds and releases the alert sounds, once the consumer
/// has drained any queued input.
pub struct RuntimeHandle {
    input: mpsc::Sender<Input>,
    events: broadcast::Sender<RuntimeEvent>,
    distance: watch::Receiver<Option<f64>>,
    task: JoinHandle<GeofenceStateMachine>,
}

impl RuntimeHandle {
    /// Events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.events.subscribe()
    }

    /// Live distance to the destination, in meters.
    pub fn distance(&self) -> watch::Receiver<Option<f64>> {
        self.distance.clone()
    }

    async fn send(&self, command: Command) -> Result<(), RuntimeError> {
        self.input
            .send(Input::Command(command))
            .await
            .map_err(|_| RuntimeError::Stopped)
    }

    pub async fn set_destination(&self, destination: Destination) -> Result<(), RuntimeError> {
        self.send(Command::SetDestination(destination)).await
    }

    pub async fn clear_destination(&self) -> Result<(), RuntimeError> {
        self.send(Command::ClearDestination).await
    }

    /// Arm with `config`, waiting for the machine's verdict.
    pub async fn start_tracking(&self, config: GeofenceConfig) -> Result<(), RuntimeError> {
        let (reply, verdict) = oneshot::channel();
        self.send(Command::StartTracking { config, reply }).await?;
        verdict.await.map_err(|_| RuntimeError::Stopped)??;
        Ok(())
    }

    pub async fn stop_tracking(&self) -> Result<(), RuntimeError> {
        self.send(Command::StopTracking).await
    }

    /// Answer the prompt for `ticket`. Answers for superseded alerts are
    /// dropped by the consumer.
    pub async fn acknowledge(
        &self,
        ticket: AlertTicket,
        action: AckAction,
    ) -> Result<(), RuntimeError> {
        self.send(Command::Acknowledge { ticket, action }).await
    }

    /// Stop feeds and consumer, release sounds, and hand back the machine.
    pub async fn shutdown(self) -> Result<GeofenceStateMachine, RuntimeError> {
        let _ = self.input.send(Input::Shutdown).await;
        self.task.await.map_err(|join_error| {
            tracing::error!(%join_error, "geofence consumer task failed");
            RuntimeError::Stopped
        })
    }
}
