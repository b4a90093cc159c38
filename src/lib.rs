//! # sched-events
//!
//! **sched-events** is the in-memory event-tracking subsystem of a cluster
//! resource scheduler. It records lifecycle occurrences (allocation requests,
//! application, queue and node transitions) so operators and tooling can audit
//! scheduling decisions after the fact or follow them live.
//!
//! The telemetry path must never slow the scheduler down: producers never
//! block, memory is bounded everywhere, and delivery is best-effort.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   scheduler thread 1   scheduler thread 2   scheduler thread N
//!           │                    │                    │
//!           └──── add_event ─────┼──── add_event ─────┘
//!                                ▼
//!                  ┌───────────────────────────┐
//!                  │ IngestQueue (bounded mpsc)│  full ─► drop
//!                  └─────────────┬─────────────┘
//!                                ▼
//!                       consumer task (single writer)
//!                                ▼
//!                  ┌───────────────────────────┐
//!                  │ EventStore (ring buffer)  │◄── get_events_from_id
//!                  │ id % capacity, monotonic  │
//!                  └─────────────┬─────────────┘
//!                                ▼
//!                  publisher task (every publish_interval)
//!                                ▼
//!                  ┌───────────────────────────┐
//!                  │ StreamRegistry            │
//!                  └───┬───────────┬───────────┘
//!                      ▼           ▼
//!                  [stream 1]  [stream N]     bounded, drop-oldest
//!                      ▼           ▼
//!                 EventStream::recv()
//!
//!   ConfigSource ──► refresh task (every refresh_interval)
//!                       ├─► EventStore::reconfigure(ring buffer capacity)
//!                       ├─► IngestQueue::resize(request capacity)
//!                       └─► tracking flag
//! ```
//!
//! ### Lifecycle
//! ```text
//! EventContext::new ──► NotStarted ──start_service()──► Running ──stop()──► Stopped
//! EventContext::init ──► stop current, replace with a fresh NotStarted instance
//! ```
//!
//! ## Features
//! | Area               | Description                                              | Key types                                  |
//! |--------------------|----------------------------------------------------------|--------------------------------------------|
//! | **Records**        | Immutable event values                                   | [`EventRecord`], [`EventType`]             |
//! | **Storage**        | Ring buffer with monotonic IDs and resize                | [`EventStore`]                             |
//! | **Streaming**      | Independent bounded consumer queues                      | [`StreamRegistry`], [`EventStream`]        |
//! | **Configuration**  | Static timings and dynamic, polled capacities            | [`EventSystemConfig`], [`ConfigSource`]    |
//! | **Orchestration**  | Lifecycle, background tasks, public surface              | [`EventSystem`], [`EventSystemImpl`], [`EventContext`] |
//! | **Errors**         | Typed config and stream errors                           | [`ConfigError`], [`StreamError`]           |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use sched_events::{EventContext, EventRecord, EventSystem, EventSystemConfig, EventType, MapConfigSource};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let cfg = EventSystemConfig {
//!         publish_interval: Duration::from_millis(10),
//!         ..EventSystemConfig::default()
//!     };
//!     let ctx = EventContext::new(cfg, Arc::new(MapConfigSource::new()));
//!
//!     let events = ctx.get_event_system();
//!     events.start_service();
//!     let stream = events.create_event_stream("audit", 100);
//!
//!     events.add_event(Some(EventRecord::new(EventType::App, "app-1", "root.default", "accepted")));
//!
//!     let record = stream.recv().await.expect("stream is open");
//!     assert_eq!(record.object_id, "app-1");
//!
//!     events.stop().await;
//! }
//! ```
mod core;
mod error;
mod events;
mod ingest;
pub mod resolver;
mod store;
mod streams;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use crate::core::{EventContext, EventSystem, EventSystemConfig, EventSystemImpl, Lifecycle};
pub use error::{ConfigError, StreamError};
pub use events::{ChangeDetail, ChangeType, EventRecord, EventType};
pub use resolver::{ConfigMap, ConfigSource, EventSettings, MapConfigSource};
pub use store::EventStore;
pub use streams::{EventStream, StreamInfo, StreamRegistry};
