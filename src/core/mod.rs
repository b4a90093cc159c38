//! Runtime core: orchestration and lifecycle.
//!
//! The public API from this module is [`EventSystem`] / [`EventSystemImpl`],
//! the [`EventContext`] that owns the current instance, and
//! [`EventSystemConfig`].
//!
//! Internal modules:
//! - [`consumer`]: drains the ingestion queue into the store;
//! - [`publisher`]: periodically pushes newly stored records to streams;
//! - [`refresh`]: polls the config source and applies capacity/flag changes;
//! - [`system`]: lifecycle, background task wiring, public surface;
//! - [`context`]: re-initialisable owner of the current instance.

mod config;
mod consumer;
mod context;
mod publisher;
mod refresh;
mod system;

pub use config::EventSystemConfig;
pub use context::EventContext;
pub use system::{EventSystem, EventSystemImpl, Lifecycle};
