//! Event data model.
//!
//! ## Contents
//! - [`EventRecord`] the immutable value producers submit
//! - [`EventType`], [`ChangeType`], [`ChangeDetail`] classification of a record
//!
//! Records become sequenced only once the ingestion consumer writes them into
//! the [`EventStore`](crate::EventStore).

mod record;

pub use record::{ChangeDetail, ChangeType, EventRecord, EventType};
