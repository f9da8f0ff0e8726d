//! # travering-state — Geofence Trigger Engine
//!
//! Owns the alarm session for one destination and decides, sample by
//! sample, when the device has entered the geofence and an alert must fire.
//!
//! ## Modules
//!
//! - **Session** (`session.rs`): `TriggerState`, the `AlarmSession` record
//!   and the `AlertTicket` that identifies one alert.
//!
//! - **Events** (`event.rs`): feed identifiers, user actions, source faults,
//!   the `GeofenceEvent` outbox items, and transition records.
//!
//! - **Machine** (`machine.rs`): `GeofenceStateMachine`, the only place an
//!   `AlarmSession` is mutated.
//!
//! ## Concurrency
//!
//! Every operation takes `&mut self` and runs to completion without
//! suspending. Whoever drives the machine funnels both position feeds
//! through one owner, so the trigger check-and-set cannot interleave with
//! another sample.

pub mod error;
pub mod event;
pub mod machine;
pub mod session;

pub use error::{ConfigProblem, GeofenceError};
pub use event::{AckAction, FeedSource, GeofenceEvent, SourceFault, TransitionRecord, TriggerEvent};
pub use machine::GeofenceStateMachine;
pub use session::{AlarmSession, AlertTicket, TriggerState};
