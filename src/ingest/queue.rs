//! # Bounded, resizable ingestion queue.
//!
//! Producers call [`IngestQueue::try_push`] from any thread; a single consumer
//! drains the queue through [`IngestReceiver::recv`].
//!
//! ## Architecture
//! ```text
//! producer 1 ──┐
//! producer 2 ──┼── try_push ──► [mpsc, bounded] ──► IngestReceiver ──► EventStore::add
//! producer N ──┘   (drop if full)
//! ```
//!
//! ## Resizing
//! A tokio channel cannot change its bound, so [`IngestQueue::resize`] builds a
//! new channel and swaps the sender under a write lock. The old sender is
//! dropped, which closes the old channel once its buffer is read. The new
//! receiver is handed to the consumer over a side channel:
//! ```text
//! resize(n):  sender ◄── write lock ── replace(tx_new)   (old tx dropped)
//!             swaps  ──► rx_new
//!
//! recv():     retired rx (drain until empty) ──► current rx ──► ...
//! ```
//! Records already buffered in a retired channel are delivered before any
//! record of the channel that replaced it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::{Semaphore, mpsc};

use crate::events::EventRecord;

/// Producer side of the ingestion queue.
pub(crate) struct IngestQueue {
    sender: RwLock<mpsc::Sender<EventRecord>>,
    capacity: AtomicU64,
    dropped: AtomicU64,
    swaps: mpsc::UnboundedSender<mpsc::Receiver<EventRecord>>,
}

/// Consumer side of the ingestion queue. Owned by the single consumer task.
pub(crate) struct IngestReceiver {
    current: mpsc::Receiver<EventRecord>,
    retired: VecDeque<mpsc::Receiver<EventRecord>>,
    swaps: mpsc::UnboundedReceiver<mpsc::Receiver<EventRecord>>,
}

/// Converts a configured capacity into a valid channel bound.
fn channel_bound(capacity: u64) -> usize {
    usize::try_from(capacity)
        .unwrap_or(usize::MAX)
        .clamp(1, Semaphore::MAX_PERMITS)
}

impl IngestQueue {
    /// Creates the queue and its consumer half.
    pub(crate) fn new(capacity: u64) -> (Self, IngestReceiver) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(channel_bound(capacity));
        let (swap_tx, swap_rx) = mpsc::unbounded_channel();

        let queue = Self {
            sender: RwLock::new(tx),
            capacity: AtomicU64::new(capacity),
            dropped: AtomicU64::new(0),
            swaps: swap_tx,
        };
        let receiver = IngestReceiver {
            current: rx,
            retired: VecDeque::new(),
            swaps: swap_rx,
        };
        (queue, receiver)
    }

    /// Attempts to enqueue without waiting.
    ///
    /// Returns `false` if the record was dropped (queue full or consumer gone).
    pub(crate) fn try_push(&self, record: EventRecord) -> bool {
        match self.sender.read().try_send(record) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Current bound.
    pub(crate) fn capacity(&self) -> u64 {
        self.capacity.load(Ordering::Acquire)
    }

    /// Total number of records rejected by [`try_push`](Self::try_push).
    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Replaces the channel with one bounded at `capacity`.
    ///
    /// No-op if the capacity is unchanged. The minimum capacity is 1 (clamped).
    pub(crate) fn resize(&self, capacity: u64) {
        let capacity = capacity.max(1);
        let old_capacity = self.capacity();
        if old_capacity == capacity {
            return;
        }

        let (tx, rx) = mpsc::channel(channel_bound(capacity));
        {
            let mut sender = self.sender.write();
            *sender = tx;
            self.capacity.store(capacity, Ordering::Release);
        }
        // Consumer gone means nobody reads either channel; nothing to hand over.
        let _ = self.swaps.send(rx);

        tracing::info!(old_capacity, new_capacity = capacity, "ingestion queue resized");
    }
}

impl IngestReceiver {
    /// Waits for the next record.
    ///
    /// Returns `None` once the producer side has been dropped and every buffered
    /// record has been delivered.
    pub(crate) async fn recv(&mut self) -> Option<EventRecord> {
        loop {
            while let Some(old) = self.retired.front_mut() {
                match old.try_recv() {
                    Ok(record) => return Some(record),
                    Err(_) => {
                        self.retired.pop_front();
                    }
                }
            }

            tokio::select! {
                biased;
                Some(next) = self.swaps.recv() => {
                    let old = std::mem::replace(&mut self.current, next);
                    self.retired.push_back(old);
                }
                record = self.current.recv() => match record {
                    Some(record) => return Some(record),
                    // Closed by a resize: the replacement is on its way.
                    None => match self.swaps.recv().await {
                        Some(next) => self.current = next,
                        None => return None,
                    },
                },
            }
        }
    }
}
