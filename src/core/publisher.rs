//! # Periodic publisher: store → streams.
//!
//! The publisher keeps its own cursor into the store's ID sequence. Each cycle
//! it reads everything stored since the previous cycle and broadcasts copies to
//! the [`StreamRegistry`]. Reads are non-destructive; the store does not know
//! the publisher exists.
//!
//! ```text
//! tick ──► get_events_from_id(cursor, batch) ──► StreamRegistry::broadcast
//!            ▲                                         │
//!            └──── cursor = last published id + 1 ◄────┘   (repeat until caught up)
//! ```
//!
//! If the ring buffer wrapped past the cursor between two cycles, publishing
//! resumes at the store's `lowest` and the gap is logged.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::store::EventStore;
use crate::streams::StreamRegistry;

pub(crate) struct Publisher {
    store: Arc<EventStore>,
    streams: Arc<StreamRegistry>,
    interval: Duration,
    batch: u64,
    /// Next ID to publish.
    cursor: u64,
}

impl Publisher {
    /// Creates a publisher that starts after everything already stored.
    pub(crate) fn new(
        store: Arc<EventStore>,
        streams: Arc<StreamRegistry>,
        interval: Duration,
        batch: u64,
    ) -> Self {
        let cursor = store.next_id();
        Self {
            store,
            streams,
            interval,
            batch: batch.max(1),
            cursor,
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
                    self.publish_pending();
                }
            }
        }
        tracing::debug!(cursor = self.cursor, "event publisher stopped");
    }

    /// Publishes every record stored since the last call.
    ///
    /// Returns the number of records published.
    pub(crate) fn publish_pending(&mut self) -> usize {
        let mut published = 0;
        loop {
            let (records, lowest, highest) = self.store.get_events_from_id(self.cursor, self.batch);
            if records.is_empty() {
                break;
            }

            let start = self.cursor.max(lowest);
            if start > self.cursor {
                tracing::debug!(
                    skipped = start - self.cursor,
                    "records evicted before publishing"
                );
            }
            self.cursor = start + records.len() as u64;
            self.streams.broadcast(&records);
            published += records.len();

            if self.cursor > highest {
                break;
            }
        }
        published
    }
}
