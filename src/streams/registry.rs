//! # Registry of event streams and broadcast fan-out.
//!
//! [`StreamRegistry`] owns the producer side of every stream and copies each
//! published record into all of them.
//!
//! ## Architecture
//! ```text
//! broadcast(records)
//!     │
//!     ├──► [stream 1] (bounded, drop-oldest) ──► EventStream::recv()
//!     ├──► [stream 2] (bounded, drop-oldest) ──► EventStream::recv()
//!     └──► [stream N] (bounded, drop-oldest) ──► EventStream::recv()
//! ```
//!
//! ## Rules
//! - **Isolation**: each stream has its own queue; a slow reader only loses its
//!   own oldest records.
//! - **Non-blocking**: `broadcast()` never waits for readers.
//! - **Names are labels**: several streams may share a name; identity is the
//!   registry-assigned id.
//! - **Pruning**: closed streams are removed on the next `broadcast()`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::stream::{EventStream, StreamInfo, StreamShared};
use crate::events::EventRecord;

/// Named, independently bounded consumer queues.
pub struct StreamRegistry {
    streams: RwLock<Vec<Arc<StreamShared>>>,
    next_id: AtomicU64,
}

impl StreamRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            streams: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers a new stream and returns its reader handle.
    ///
    /// ### Notes
    /// - The minimum capacity is 1 (clamped).
    /// - The stream only sees records published after it was created.
    pub fn create(&self, name: impl Into<String>, capacity: u64) -> EventStream {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let capacity = usize::try_from(capacity).unwrap_or(usize::MAX).max(1);
        let shared = Arc::new(StreamShared::new(id, name.into(), capacity));

        self.streams.write().push(Arc::clone(&shared));
        tracing::debug!(stream_id = id, name = %shared.name, capacity, "event stream created");
        EventStream::new(shared)
    }

    /// Closes the stream and removes it from the registry.
    ///
    /// Returns `false` if the stream was not registered here (or already removed).
    pub fn remove(&self, stream: &EventStream) -> bool {
        stream.close();
        let mut streams = self.streams.write();
        let before = streams.len();
        streams.retain(|s| !Arc::ptr_eq(s, stream.shared()));
        let removed = streams.len() != before;
        drop(streams);

        if removed {
            tracing::debug!(stream_id = stream.id(), name = stream.name(), "event stream removed");
        }
        removed
    }

    /// Returns a snapshot of every open stream, in creation order.
    ///
    /// Closed streams are pruned first.
    pub fn list(&self) -> Vec<StreamInfo> {
        self.prune();
        self.streams
            .read()
            .iter()
            .filter(|s| !s.is_closed())
            .map(|s| StreamInfo::from(&**s))
            .collect()
    }

    /// Number of open streams.
    pub fn len(&self) -> usize {
        self.streams.read().iter().filter(|s| !s.is_closed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pushes a copy of every record into every open stream.
    ///
    /// Closed streams found along the way are pruned. Returns the number of
    /// streams that received the batch.
    pub fn broadcast(&self, records: &[EventRecord]) -> usize {
        let mut saw_closed = false;
        let mut delivered = 0;
        {
            let streams = self.streams.read();
            for stream in streams.iter() {
                if stream.is_closed() {
                    saw_closed = true;
                    continue;
                }
                if records.is_empty() {
                    continue;
                }
                for record in records {
                    stream.push(record.clone());
                }
                delivered += 1;
            }
        }
        if saw_closed {
            self.prune();
        }
        delivered
    }

    /// Closes every stream and empties the registry.
    pub fn close_all(&self) {
        let streams = std::mem::take(&mut *self.streams.write());
        for stream in &streams {
            stream.close();
        }
        if !streams.is_empty() {
            tracing::debug!(count = streams.len(), "event streams closed");
        }
    }

    fn prune(&self) {
        let mut streams = self.streams.write();
        let before = streams.len();
        streams.retain(|s| !s.is_closed());
        let pruned = before - streams.len();
        if pruned > 0 {
            tracing::debug!(pruned, "closed event streams pruned");
        }
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
