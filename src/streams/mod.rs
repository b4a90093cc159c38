//! Event streaming: per-consumer bounded queues fed by the publisher.
//!
//! ## Contents
//! - [`StreamRegistry`] registry of streams and broadcast fan-out
//! - [`EventStream`] reader handle returned to the stream's creator
//! - [`StreamInfo`] introspection snapshot returned by listings
//!
//! Delivery is best-effort: a full stream evicts its oldest record.

mod registry;
mod stream;

pub use registry::StreamRegistry;
pub use stream::{EventStream, StreamInfo};
