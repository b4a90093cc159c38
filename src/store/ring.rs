//! # Fixed-capacity ring buffer of sequenced events.
//!
//! [`EventStore`] keeps the most recent `capacity` records. Every record gets
//! the next ID from a monotonically increasing `u64` counter and lives in slot
//! `id % capacity`; once the buffer is saturated each insert overwrites the
//! oldest retained record.
//!
//! ## Layout
//! ```text
//! capacity = 4, ten records added (IDs 0..=9):
//!
//!   slot:     0     1     2     3
//!           ┌─────┬─────┬─────┬─────┐
//!   id:     │  8  │  9  │  6  │  7  │
//!           └─────┴─────┴─────┴─────┘
//!                         ▲           lowest = 6, highest = 9
//!                         └── next eviction
//! ```
//!
//! ## Rules
//! - **Single sequence**: IDs are assigned in insertion order, never reused.
//! - **Window**: the retained IDs are exactly `[lowest, highest]`, with
//!   `highest - lowest + 1 <= capacity`.
//! - **Non-destructive reads**: [`collect_events`](EventStore::collect_events) and
//!   [`get_events_from_id`](EventStore::get_events_from_id) copy records out.
//! - **Resize keeps the newest**: shrinking below the retained count evicts the
//!   oldest records and advances `lowest`.
//!
//! Slots are allocated lazily, so a large configured capacity costs nothing
//! until records actually arrive.

use parking_lot::RwLock;

use crate::events::EventRecord;

/// Thread-safe ring buffer assigning monotonic IDs.
///
/// All methods take `&self`; writes (`add`, `reconfigure`) hold the write lock,
/// reads hold the read lock, so a capacity change never interleaves with an
/// insert.
pub struct EventStore {
    ring: RwLock<Ring>,
}

struct Ring {
    slots: Vec<Option<EventRecord>>,
    capacity: u64,
    /// ID the next insert will get.
    next_id: u64,
    /// Number of retained records.
    len: u64,
}

impl Ring {
    fn slot(&self, id: u64) -> usize {
        (id % self.capacity) as usize
    }

    fn lowest(&self) -> u64 {
        self.next_id - self.len
    }

    fn bounds(&self) -> Option<(u64, u64)> {
        (self.len > 0).then(|| (self.lowest(), self.next_id - 1))
    }

    fn put(&mut self, id: u64, record: EventRecord) {
        let idx = self.slot(id);
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        self.slots[idx] = Some(record);
    }

    fn get(&self, id: u64) -> Option<&EventRecord> {
        self.slots.get(self.slot(id)).and_then(Option::as_ref)
    }
}

impl EventStore {
    /// Creates an empty store.
    ///
    /// ### Notes
    /// - The minimum capacity is 1 (clamped).
    /// - The first assigned ID is `0`.
    pub fn new(capacity: u64) -> Self {
        Self {
            ring: RwLock::new(Ring {
                slots: Vec::new(),
                capacity: capacity.max(1),
                next_id: 0,
                len: 0,
            }),
        }
    }

    /// Stores a record and returns its ID.
    ///
    /// Never fails and never blocks beyond the write lock; when the buffer is
    /// full the oldest record is overwritten.
    pub fn add(&self, record: EventRecord) -> u64 {
        let mut ring = self.ring.write();
        let id = ring.next_id;
        ring.put(id, record);
        ring.next_id += 1;
        if ring.len < ring.capacity {
            ring.len += 1;
        }
        id
    }

    /// Number of currently retained records (`0..=capacity`).
    pub fn count_stored_events(&self) -> u64 {
        self.ring.read().len
    }

    /// Current capacity.
    pub fn capacity(&self) -> u64 {
        self.ring.read().capacity
    }

    /// ID the next [`add`](Self::add) will assign.
    pub fn next_id(&self) -> u64 {
        self.ring.read().next_id
    }

    /// Returns `(lowest, highest)` retained IDs, or `None` if nothing is stored.
    pub fn bounds(&self) -> Option<(u64, u64)> {
        self.ring.read().bounds()
    }

    /// Returns a copy of every retained record, ascending by ID.
    ///
    /// The store is left untouched.
    pub fn collect_events(&self) -> Vec<EventRecord> {
        let ring = self.ring.read();
        match ring.bounds() {
            Some((lowest, highest)) => (lowest..=highest)
                .filter_map(|id| ring.get(id).cloned())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Returns up to `count` consecutive records starting at `max(id, lowest)`,
    /// together with the current `lowest` and `highest` IDs.
    ///
    /// - If `id > highest` the record list is empty.
    /// - If `id < lowest` the requested records were already evicted; reading
    ///   resumes at `lowest`, which callers can detect from the returned bounds.
    /// - An empty store reports `(0, 0)` as its bounds.
    ///
    /// # Example
    /// ```
    /// use sched_events::{EventRecord, EventStore, EventType};
    ///
    /// let store = EventStore::new(100);
    /// for i in 0..10 {
    ///     store.add(EventRecord::new(EventType::Request, "alloc1", "app1", i.to_string()));
    /// }
    ///
    /// let (records, lowest, highest) = store.get_events_from_id(3, 3);
    /// assert_eq!((lowest, highest), (0, 9));
    /// let messages: Vec<_> = records.iter().map(|r| r.message.as_str()).collect();
    /// assert_eq!(messages, ["3", "4", "5"]);
    /// ```
    pub fn get_events_from_id(&self, id: u64, count: u64) -> (Vec<EventRecord>, u64, u64) {
        let ring = self.ring.read();
        let Some((lowest, highest)) = ring.bounds() else {
            return (Vec::new(), 0, 0);
        };
        if id > highest || count == 0 {
            return (Vec::new(), lowest, highest);
        }

        let start = id.max(lowest);
        let end = start.saturating_add(count - 1).min(highest);
        let records = (start..=end)
            .filter_map(|i| ring.get(i).cloned())
            .collect();
        (records, lowest, highest)
    }

    /// Changes the capacity.
    ///
    /// When the new capacity is smaller than the retained count, only the most
    /// recent `new_capacity` records survive and `lowest` moves forward.
    /// IDs already assigned keep their values; the sequence continues.
    ///
    /// The minimum capacity is 1 (clamped).
    pub fn reconfigure(&self, new_capacity: u64) {
        let new_capacity = new_capacity.max(1);
        let mut ring = self.ring.write();
        if ring.capacity == new_capacity {
            return;
        }

        let old_capacity = ring.capacity;
        let keep = ring.len.min(new_capacity);
        let evicted = ring.len - keep;
        let first_kept = ring.next_id - keep;

        let mut old = std::mem::take(&mut ring.slots);
        let mut kept = Vec::with_capacity(keep as usize);
        for id in first_kept..ring.next_id {
            let idx = (id % old_capacity) as usize;
            if let Some(record) = old.get_mut(idx).and_then(Option::take) {
                kept.push((id, record));
            }
        }
        drop(old);

        ring.capacity = new_capacity;
        ring.len = keep;
        for (id, record) in kept {
            ring.put(id, record);
        }

        tracing::info!(
            old_capacity,
            new_capacity,
            retained = keep,
            evicted,
            "event store resized"
        );
    }
}
