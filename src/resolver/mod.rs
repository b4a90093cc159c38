//! Dynamic configuration: where settings come from and how raw values are
//! turned into validated capacities and flags.
//!
//! ## Contents
//! - [`ConfigSource`] pull contract for key/value snapshots, [`MapConfigSource`]
//!   an in-memory implementation
//! - [`get_request_capacity`], [`get_ring_buffer_capacity`],
//!   [`is_event_tracking_enabled`] pure resolvers with defaults
//! - [`EventSettings`] all three settings resolved at once

mod resolve;
mod source;

pub use resolve::{
    CM_EVENT_REQUEST_CAPACITY, CM_EVENT_RING_BUFFER_CAPACITY, CM_EVENT_TRACKING_ENABLED,
    DEFAULT_EVENT_REQUEST_CAPACITY, DEFAULT_EVENT_RING_BUFFER_CAPACITY,
    DEFAULT_EVENT_TRACKING_ENABLED, EventSettings, get_request_capacity,
    get_ring_buffer_capacity, is_event_tracking_enabled, parse_capacity, parse_flag,
};
pub use source::{ConfigMap, ConfigSource, MapConfigSource};
