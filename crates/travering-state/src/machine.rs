//! # Geofence State Machine
//!
//! Consumes position samples from both feeds and fires at most one alert
//! per approach.
//!
//! ## Trigger Guard
//!
//! `on_position` computes the distance and performs the check-and-set of
//! `trigger_in_flight` in one synchronous call on `&mut self`. A poll
//! sample and a push sample that both land inside the radius in the same
//! update window are applied one after the other; the second finds the
//! flag set and does nothing.
//!
//! ## Cooldown
//!
//! After `acknowledge(Snooze)` at `t0`, the machine stays `Snoozed` until a
//! sample arrives at `now` with `now - t0 >= cooldown_ms`. That sample
//! re-arms the machine and is then evaluated like any other.
//!
//! ## Stale Alerts
//!
//! Every reset (stop, destination change) starts a new session epoch.
//! Acknowledgments carry the [`AlertTicket`] of the alert they answer and
//! are dropped when the ticket no longer matches.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use travering_core::{
    distance, Clock, Destination, GeofenceConfig, Position, PositionSample, SystemClock,
};

use crate::error::{ConfigProblem, GeofenceError};
use crate::event::{AckAction, FeedSource, GeofenceEvent, SourceFault, TransitionRecord, TriggerEvent};
use crate::session::{AlarmSession, AlertTicket, TriggerState};

/// The geofence trigger engine.
#[derive(Debug)]
pub struct GeofenceStateMachine {
    clock: Arc<dyn Clock>,
    destination: Option<Destination>,
    config: Option<GeofenceConfig>,
    tracking: bool,
    session: AlarmSession,
    last_position: Option<Position>,
    events: Vec<GeofenceEvent>,
    history: Vec<TransitionRecord>,
}

impl Default for GeofenceStateMachine {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl GeofenceStateMachine {
    /// Create an idle machine reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            destination: None,
            config: None,
            tracking: false,
            session: AlarmSession::new(),
            last_position: None,
            events: Vec::new(),
            history: Vec::new(),
        }
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Replace the destination and reset the session.
    ///
    /// Lands in `Armed` when tracking is on, `Idle` otherwise. Clears the
    /// trigger count, the in-flight flag and any cooldown window.
    pub fn set_destination(&mut self, destination: Destination) {
        info!(%destination, "destination set");
        self.destination = Some(destination);
        self.session.reset();
        if self.tracking {
            self.transition(TriggerState::Armed, "destination changed", GeofenceEvent::Armed);
        } else {
            self.transition(TriggerState::Idle, "destination changed", GeofenceEvent::Idle);
        }
    }

    /// Remove the destination. The machine goes `Idle` until a new one is set.
    pub fn clear_destination(&mut self) {
        info!("destination cleared");
        self.destination = None;
        self.session.reset();
        self.transition(TriggerState::Idle, "destination cleared", GeofenceEvent::Idle);
    }

    /// Start tracking with `config`.
    ///
    /// # Errors
    ///
    /// [`GeofenceError::InvalidConfig`] if no destination is set or the
    /// radius is below the 10 m minimum. The machine is left unchanged.
    pub fn start_tracking(&mut self, config: GeofenceConfig) -> Result<(), GeofenceError> {
        if self.destination.is_none() {
            return Err(GeofenceError::InvalidConfig(ConfigProblem::MissingDestination));
        }
        config.check_trackable()?;

        info!(
            radius_m = config.radius_meters(),
            cooldown_ms = config.cooldown_ms(),
            "tracking started"
        );
        self.config = Some(config);
        self.tracking = true;
        self.session.reset();
        self.transition(TriggerState::Armed, "tracking started", GeofenceEvent::Armed);
        Ok(())
    }

    /// Stop tracking from any state. Pending alerts become stale.
    pub fn stop_tracking(&mut self) {
        info!("tracking stopped");
        self.tracking = false;
        self.session.reset();
        self.transition(TriggerState::Idle, "tracking stopped", GeofenceEvent::Idle);
    }

    /// Feed one position sample.
    ///
    /// Returns the trigger event when this sample fired the alert. Samples
    /// with missing or out-of-domain coordinates are ignored.
    pub fn on_position(&mut self, sample: PositionSample, source: FeedSource) -> Option<TriggerEvent> {
        let now = self.clock.now();
        let position = match sample.into_position(now) {
            Ok(position) => position,
            Err(e) => {
                debug!(%source, error = %e, "ignoring incomplete position sample");
                metrics::counter!("travering_samples_ignored_total", "source" => source.to_string())
                    .increment(1);
                return None;
            }
        };
        self.last_position = Some(position);

        if self.session.state == TriggerState::Snoozed && self.cooldown_elapsed(now) {
            self.transition(TriggerState::Armed, "cooldown elapsed", GeofenceEvent::Armed);
        }

        if self.session.state != TriggerState::Armed {
            trace!(%source, state = %self.session.state, "sample recorded, not armed");
            return None;
        }
        let (destination, config) = match (self.destination, self.config) {
            (Some(d), Some(c)) => (d, c),
            _ => return None,
        };

        let distance_m = distance(&position, &destination);
        if distance_m > config.radius_meters() {
            trace!(%source, distance_m, "outside geofence");
            return None;
        }

        // Check-and-set: only the first qualifying sample gets past here.
        if self.session.trigger_in_flight {
            debug!(%source, distance_m, "trigger already in flight");
            return None;
        }
        self.session.trigger_in_flight = true;
        self.session.trigger_count += 1;

        let event = TriggerEvent {
            ticket: self.session.current_ticket(),
            position,
            distance_meters: distance_m,
            trigger_count: self.session.trigger_count,
            source,
        };
        info!(
            %source,
            distance_m,
            trigger_count = event.trigger_count,
            ticket = %event.ticket,
            "geofence entered"
        );
        metrics::counter!("travering_triggers_total").increment(1);
        self.transition(
            TriggerState::Triggered,
            "entered geofence",
            GeofenceEvent::Triggered(event.clone()),
        );
        Some(event)
    }

    /// Answer the current alert. Returns whether the action took effect;
    /// anything but `Triggered` ignores it.
    pub fn acknowledge(&mut self, action: AckAction) -> bool {
        if !self.session.state.awaiting_ack() {
            debug!(%action, state = %self.session.state, "acknowledgment ignored");
            return false;
        }
        match action {
            AckAction::Snooze => {
                let now = self.clock.now();
                let cooldown = self.config.map(|c| c.cooldown_ms()).unwrap_or(0);
                self.session.trigger_in_flight = false;
                self.session.last_dismissed_at = Some(now);
                info!(cooldown_ms = cooldown, "alert snoozed");
                self.transition(
                    TriggerState::Snoozed,
                    "snoozed by user",
                    GeofenceEvent::Snoozed {
                        rearm_after: now.plus_millis(i64::try_from(cooldown).unwrap_or(i64::MAX)),
                    },
                );
            }
            AckAction::Stop => self.stop_tracking(),
        }
        true
    }

    /// Answer a specific alert. Ignored unless `ticket` is the alert
    /// currently awaiting acknowledgment.
    pub fn acknowledge_ticket(&mut self, ticket: AlertTicket, action: AckAction) -> bool {
        if !self.is_current(ticket) {
            debug!(%ticket, current = %self.session.current_ticket(), "stale acknowledgment dropped");
            return false;
        }
        self.acknowledge(action)
    }

    /// Pass a position feed failure through to the UI. State is unchanged.
    pub fn report_source_error(&mut self, fault: SourceFault) {
        warn!(%fault, "position source failed");
        let event = match fault {
            SourceFault::PermissionDenied => GeofenceEvent::PermissionRequired,
            fault => GeofenceEvent::SourceError { fault },
        };
        self.events.push(event);
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Current state.
    pub fn state(&self) -> TriggerState {
        self.session.state
    }

    /// The alarm session record.
    pub fn session(&self) -> &AlarmSession {
        &self.session
    }

    /// Active destination, if any.
    pub fn destination(&self) -> Option<Destination> {
        self.destination
    }

    /// Configuration of the current or last tracking run.
    pub fn config(&self) -> Option<GeofenceConfig> {
        self.config
    }

    /// Whether tracking is enabled.
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Most recent valid sample, whatever the state.
    pub fn last_position(&self) -> Option<Position> {
        self.last_position
    }

    /// Distance from the last sample to the destination, for display.
    pub fn distance_meters(&self) -> Option<f64> {
        match (self.last_position, self.destination) {
            (Some(p), Some(d)) => Some(distance(&p, &d)),
            _ => None,
        }
    }

    /// Whether `ticket` identifies the alert currently awaiting the user.
    pub fn is_current(&self, ticket: AlertTicket) -> bool {
        self.session.state == TriggerState::Triggered && self.session.current_ticket() == ticket
    }

    /// Take all events emitted since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<GeofenceEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ordered log of state transitions.
    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    /// Drop the transition log.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ── Internals ────────────────────────────────────────────────────

    fn cooldown_elapsed(&self, now: travering_core::Timestamp) -> bool {
        let Some(dismissed) = self.session.last_dismissed_at else {
            return true;
        };
        let cooldown = self.config.map(|c| c.cooldown_ms()).unwrap_or(0);
        now.millis_since(dismissed) >= i64::try_from(cooldown).unwrap_or(i64::MAX)
    }

    fn transition(&mut self, to: TriggerState, reason: &str, event: GeofenceEvent) {
        self.history.push(TransitionRecord {
            from_state: self.session.state,
            to_state: to,
            timestamp: self.clock.now(),
            reason: reason.to_string(),
        });
        self.session.state = to;
        self.events.push(event);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
