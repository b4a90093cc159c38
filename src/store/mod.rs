//! Event storage.
//!
//! [`EventStore`] is the bounded, in-memory ring buffer the ingestion consumer
//! writes into and every query reads from. Nothing is persisted.

mod ring;

pub use ring::EventStore;
