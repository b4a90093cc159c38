//! Ingestion path: producers → bounded queue → single consumer.
//!
//! The queue is never awaited by producers; a full queue drops the record.
//! The consumer task that drains it lives in the core runtime.

mod queue;

pub(crate) use queue::{IngestQueue, IngestReceiver};
