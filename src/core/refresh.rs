//! # Configuration refresh.
//!
//! Polls the [`ConfigSource`] on a fixed period, resolves [`EventSettings`]
//! and, when they differ from the last applied ones, pushes the change into
//! the running components:
//!
//! ```text
//! snapshot ──► EventSettings::resolve ──► changed? ──┬─► tracking flag (atomic)
//!                                                    ├─► EventStore::reconfigure
//!                                                    └─► IngestQueue::resize
//! ```
//!
//! Convergence is eventual: a change is visible at most one refresh interval
//! after the source starts returning it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::ingest::IngestQueue;
use crate::resolver::{ConfigSource, EventSettings};
use crate::store::EventStore;

pub(crate) struct ConfigRefresher {
    source: Arc<dyn ConfigSource>,
    store: Arc<EventStore>,
    queue: Arc<IngestQueue>,
    tracking_enabled: Arc<AtomicBool>,
    interval: Duration,
    applied: EventSettings,
}

impl ConfigRefresher {
    pub(crate) fn new(
        source: Arc<dyn ConfigSource>,
        store: Arc<EventStore>,
        queue: Arc<IngestQueue>,
        tracking_enabled: Arc<AtomicBool>,
        interval: Duration,
    ) -> Self {
        let applied = EventSettings {
            tracking_enabled: tracking_enabled.load(Ordering::Acquire),
            ring_buffer_capacity: store.capacity(),
            request_capacity: queue.capacity(),
        };
        Self {
            source,
            store,
            queue,
            tracking_enabled,
            interval,
            applied,
        }
    }

    pub(crate) async fn run(mut self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    self.refresh();
                }
            }
        }
        tracing::debug!("config refresh stopped");
    }

    /// Re-reads the source and applies any change.
    ///
    /// Returns `true` if something changed.
    pub(crate) fn refresh(&mut self) -> bool {
        let next = EventSettings::resolve(&self.source.snapshot());
        if next == self.applied {
            return false;
        }

        let prev = self.applied;
        if next.tracking_enabled != prev.tracking_enabled {
            self.tracking_enabled
                .store(next.tracking_enabled, Ordering::Release);
        }
        if next.ring_buffer_capacity != prev.ring_buffer_capacity {
            self.store.reconfigure(next.ring_buffer_capacity);
        }
        if next.request_capacity != prev.request_capacity {
            self.queue.resize(next.request_capacity);
        }
        self.applied = next;

        tracing::info!(
            tracking_enabled = next.tracking_enabled,
            ring_buffer_capacity = next.ring_buffer_capacity,
            request_capacity = next.request_capacity,
            "event configuration updated"
        );
        true
    }
}
