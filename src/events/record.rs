//! # Event records produced by the scheduler.
//!
//! An [`EventRecord`] describes one lifecycle occurrence: an allocation request
//! being placed, an application changing state, a node being added and so on.
//! Records are plain values; they have no identity until the
//! [`EventStore`](crate::EventStore) assigns them an ID.
//!
//! The [`EventType`] names the kind of object the record is about, while the
//! optional [`ChangeType`] / [`ChangeDetail`] pair narrows down what happened
//! to it.
//!
//! ## Example
//! ```rust
//! use sched_events::{ChangeDetail, ChangeType, EventRecord, EventType};
//!
//! let ev = EventRecord::new(EventType::Request, "alloc1", "app1", "placed on node-3")
//!     .with_change(ChangeType::Add, ChangeDetail::RequestAlloc);
//!
//! assert_eq!(ev.event_type, EventType::Request);
//! assert_eq!(ev.object_id, "alloc1");
//! assert_eq!(ev.change_detail, ChangeDetail::RequestAlloc);
//! ```

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Kind of object an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventType {
    #[default]
    Unknown,
    /// Allocation request (object: request key, reference: application).
    Request,
    /// Application (object: application, reference: queue or allocation).
    App,
    /// Node (object: node, reference: allocation).
    Node,
    /// Queue (object: queue path, reference: application).
    Queue,
    /// User or group quota tracking.
    UserGroup,
}

impl EventType {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventType::Unknown => "unknown",
            EventType::Request => "request",
            EventType::App => "app",
            EventType::Node => "node",
            EventType::Queue => "queue",
            EventType::UserGroup => "user_group",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// What happened to the object's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChangeType {
    #[default]
    None,
    Set,
    Add,
    Remove,
}

/// Finer-grained reason for a change.
///
/// Grouped by the [`EventType`] it normally accompanies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChangeDetail {
    #[default]
    None,

    // === Requests ===
    RequestCancel,
    RequestAlloc,
    RequestTimeout,

    // === Applications ===
    AppAlloc,
    AppRequest,
    AppReject,
    AppNew,
    AppAccepted,
    AppRunning,
    AppCompleting,
    AppCompleted,
    AppFailing,
    AppFailed,
    AppResuming,
    AppExpired,

    // === Nodes ===
    NodeDecommission,
    NodeReady,
    NodeSchedulable,
    NodeAlloc,
    NodeCapacity,
    NodeOccupied,
    NodeReservation,

    // === Queues ===
    QueueConfig,
    QueueDynamic,
    QueueType,
    QueueMax,
    QueueGuaranteed,
    QueueApp,

    // === Allocations ===
    AllocCancel,
    AllocPreempt,
    AllocTimeout,
    AllocReplaced,
    AllocNodeRemoved,
}

/// One scheduler occurrence.
///
/// Built once and never mutated afterwards; copies travel independently into
/// the store and into every stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Kind of object this event is about.
    pub event_type: EventType,
    /// Primary subject (allocation key, application ID, node ID, queue path).
    pub object_id: String,
    /// Related subject, empty when not applicable.
    pub reference_id: String,
    /// Free-form description.
    pub message: String,
    pub change_type: ChangeType,
    pub change_detail: ChangeDetail,
    /// Wall-clock nanoseconds since the Unix epoch at construction.
    pub timestamp_nano: i64,
}

impl EventRecord {
    /// Creates a record stamped with the current wall-clock time.
    pub fn new(
        event_type: EventType,
        object_id: impl Into<String>,
        reference_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            object_id: object_id.into(),
            reference_id: reference_id.into(),
            message: message.into(),
            change_type: ChangeType::None,
            change_detail: ChangeDetail::None,
            timestamp_nano: now_nanos(),
        }
    }

    /// Sets the change type and detail.
    #[inline]
    pub fn with_change(mut self, change_type: ChangeType, detail: ChangeDetail) -> Self {
        self.change_type = change_type;
        self.change_detail = detail;
        self
    }

    /// Overrides the timestamp (nanoseconds since the Unix epoch).
    #[inline]
    pub fn with_timestamp_nano(mut self, nanos: i64) -> Self {
        self.timestamp_nano = nanos;
        self
    }
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
