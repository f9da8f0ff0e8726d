//! # Position Feeds
//!
//! A [`PositionFeed`] yields samples (or faults) from one source until it
//! is exhausted. Two live feeds exist:
//!
//! - [`PollingFeed`] asks a [`LocationProvider`] for the current position
//!   on a fixed interval.
//! - [`PushFeed`] receives updates pushed by the platform, dropping those
//!   that moved less than a minimum distance since the last one passed on.
//!
//! [`ReplayFeed`] yields a prepared list, for tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

use travering_core::{distance_between, Coordinates, PositionSample};
use travering_state::{FeedSource, SourceFault};

/// One item from a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    Sample(PositionSample),
    Fault(SourceFault),
}

/// A source of position samples.
#[async_trait]
pub trait PositionFeed: Send {
    /// Which source this is, for logging.
    fn source(&self) -> FeedSource;

    /// The next message, or `None` once the feed is exhausted.
    async fn next(&mut self) -> Option<FeedMessage>;
}

/// One-shot position lookup, used by the polling feed.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<PositionSample, SourceFault>;
}

// ─── Poll ────────────────────────────────────────────────────────────

/// Polls a [`LocationProvider`] on a fixed interval. Never exhausts.
pub struct PollingFeed {
    provider: Arc<dyn LocationProvider>,
    interval: Interval,
}

impl PollingFeed {
    /// The first poll happens immediately.
    pub fn new(provider: Arc<dyn LocationProvider>, period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { provider, interval }
    }
}

#[async_trait]
impl PositionFeed for PollingFeed {
    fn source(&self) -> FeedSource {
        FeedSource::Poll
    }

    async fn next(&mut self) -> Option<FeedMessage> {
        self.interval.tick().await;
        Some(match self.provider.current_position().await {
            Ok(sample) => FeedMessage::Sample(sample),
            Err(fault) => FeedMessage::Fault(fault),
        })
    }
}

// ─── Push ────────────────────────────────────────────────────────────

/// Platform-side handle for pushing updates into a [`PushFeed`].
#[derive(Debug, Clone)]
pub struct PushSender {
    tx: mpsc::Sender<FeedMessage>,
}

impl PushSender {
    /// Push a sample. Returns `false` once the feed has been dropped.
    pub async fn sample(&self, sample: PositionSample) -> bool {
        self.tx.send(FeedMessage::Sample(sample)).await.is_ok()
    }

    /// Push a fault. Returns `false` once the feed has been dropped.
    pub async fn fault(&self, fault: SourceFault) -> bool {
        self.tx.send(FeedMessage::Fault(fault)).await.is_ok()
    }
}

/// Drops samples that moved less than a minimum distance from the last
/// sample it admitted.
#[derive(Debug, Clone)]
pub struct MovementFilter {
    min_distance_meters: f64,
    last_admitted: Option<Coordinates>,
}

impl MovementFilter {
    pub fn new(min_distance_meters: f64) -> Self {
        Self {
            min_distance_meters,
            last_admitted: None,
        }
    }

    /// Whether `sample` should be passed on.
    pub fn admit(&mut self, sample: &PositionSample) -> bool {
        // Incomplete samples pass through; the state machine discards them.
        let (Some(lat), Some(lon)) = (sample.latitude, sample.longitude) else {
            return true;
        };
        let Ok(here) = Coordinates::new(lat, lon) else {
            return true;
        };
        if let Some(last) = self.last_admitted {
            if distance_between(last, here) < self.min_distance_meters {
                return false;
            }
        }
        self.last_admitted = Some(here);
        true
    }
}

/// Receives pushed updates. Exhausts when every [`PushSender`] is dropped.
pub struct PushFeed {
    rx: mpsc::Receiver<FeedMessage>,
    filter: MovementFilter,
}

impl PushFeed {
    /// A connected sender/feed pair.
    pub fn channel(capacity: usize, min_distance_meters: f64) -> (PushSender, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        let feed = Self {
            rx,
            filter: MovementFilter::new(min_distance_meters),
        };
        (PushSender { tx }, feed)
    }
}

#[async_trait]
impl PositionFeed for PushFeed {
    fn source(&self) -> FeedSource {
        FeedSource::Push
    }

    async fn next(&mut self) -> Option<FeedMessage> {
        loop {
            let message = self.rx.recv().await?;
            match &message {
                FeedMessage::Sample(sample) if !self.filter.admit(sample) => {
                    tracing::trace!("push sample below minimum movement, skipped");
                }
                _ => return Some(message),
            }
        }
    }
}

// ─── Replay ──────────────────────────────────────────────────────────

/// Yields a fixed list, optionally pausing before each item.
pub struct ReplayFeed {
    source: FeedSource,
    items: VecDeque<FeedMessage>,
    pause: Duration,
}

impl ReplayFeed {
    pub fn new(source: FeedSource, items: impl IntoIterator<Item = FeedMessage>) -> Self {
        Self {
            source,
            items: items.into_iter().collect(),
            pause: Duration::ZERO,
        }
    }

    /// Sleep for `pause` before yielding each item.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }
}

#[async_trait]
impl PositionFeed for ReplayFeed {
    fn source(&self) -> FeedSource {
        self.source
    }

    async fn next(&mut self) -> Option<FeedMessage> {
        if self.items.is_empty() {
            return None;
        }
        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }
        self.items.pop_front()
    }
}
