//! # Bounded, drop-oldest event stream.
//!
//! An [`EventStream`] is the reader handle returned by
//! [`StreamRegistry::create`](crate::StreamRegistry::create). The registry keeps
//! the other end and pushes a copy of every newly published record into it.
//!
//! ## Rules
//! - **Bounded**: at most `capacity` records are queued.
//! - **Drop-oldest**: a push into a full queue evicts the oldest queued record
//!   (counted in [`EventStream::dropped`]).
//! - **FIFO**: records are read in the order they were published.
//! - **Close on drop**: dropping the handle closes the stream; the registry
//!   prunes it on its next pass.
//!
//! ## Example
//! ```rust
//! use sched_events::{EventRecord, EventType, StreamRegistry};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let registry = StreamRegistry::new();
//! let stream = registry.create("audit", 2);
//!
//! registry.broadcast(&[
//!     EventRecord::new(EventType::Queue, "root.a", "", "1"),
//!     EventRecord::new(EventType::Queue, "root.a", "", "2"),
//!     EventRecord::new(EventType::Queue, "root.a", "", "3"),
//! ]);
//!
//! assert_eq!(stream.dropped(), 1);
//! assert_eq!(stream.recv().await.unwrap().message, "2");
//! assert_eq!(stream.recv().await.unwrap().message, "3");
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::SystemTime;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::StreamError;
use crate::events::EventRecord;

/// State shared between the registry and the reader handle.
pub(crate) struct StreamShared {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) capacity: usize,
    pub(crate) created_at: SystemTime,
    queue: Mutex<VecDeque<EventRecord>>,
    closed: AtomicBool,
    dropped: AtomicU64,
    notify: Notify,
}

impl StreamShared {
    pub(crate) fn new(id: u64, name: String, capacity: usize) -> Self {
        Self {
            id,
            name,
            capacity,
            created_at: SystemTime::now(),
            queue: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            notify: Notify::new(),
        }
    }

    /// Queues a copy, evicting the oldest record if full.
    ///
    /// Returns `false` if the stream is closed.
    pub(crate) fn push(&self, record: EventRecord) -> bool {
        if self.is_closed() {
            return false;
        }
        {
            let mut queue = self.queue.lock();
            if queue.len() >= self.capacity {
                queue.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            queue.push_back(record);
        }
        self.notify.notify_waiters();
        true
    }

    pub(crate) fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.notify.notify_waiters();
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn queued(&self) -> usize {
        self.queue.lock().len()
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn try_recv(&self) -> Result<EventRecord, StreamError> {
        match self.queue.lock().pop_front() {
            Some(record) => Ok(record),
            None if self.is_closed() => Err(StreamError::Closed),
            None => Err(StreamError::Empty),
        }
    }
}

/// Reader handle for one stream.
///
/// Queued records remain readable after the stream is closed; reads report
/// [`StreamError::Closed`] / `None` only once the queue is empty.
pub struct EventStream {
    shared: Arc<StreamShared>,
}

impl EventStream {
    pub(crate) fn new(shared: Arc<StreamShared>) -> Self {
        Self { shared }
    }

    pub(crate) fn shared(&self) -> &Arc<StreamShared> {
        &self.shared
    }

    /// Registry-assigned identifier, unique per registry.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Number of records waiting to be read.
    pub fn len(&self) -> usize {
        self.shared.queued()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Records evicted from this stream because it was full.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped()
    }

    /// Takes the next record without waiting.
    pub fn try_recv(&self) -> Result<EventRecord, StreamError> {
        self.shared.try_recv()
    }

    /// Waits for the next record.
    ///
    /// Returns `None` once the stream is closed and drained.
    pub async fn recv(&self) -> Option<EventRecord> {
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a push between the check and the
            // await is not missed.
            notified.as_mut().enable();

            match self.shared.try_recv() {
                Ok(record) => return Some(record),
                Err(StreamError::Closed) => return None,
                Err(StreamError::Empty) => notified.await,
            }
        }
    }

    /// Closes the stream. Already queued records can still be read.
    pub fn close(&self) {
        self.shared.close();
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.shared.close();
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field("capacity", &self.shared.capacity)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Introspection snapshot of an open stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub id: u64,
    pub name: String,
    pub capacity: usize,
    /// Records currently waiting to be read.
    pub queued: usize,
    /// Records evicted because the stream was full.
    pub dropped: u64,
    pub created_at: SystemTime,
}

impl From<&StreamShared> for StreamInfo {
    fn from(s: &StreamShared) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            capacity: s.capacity,
            queued: s.queued(),
            dropped: s.dropped(),
            created_at: s.created_at,
        }
    }
}
