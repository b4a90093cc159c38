//! # Resolution of raw configuration values.
//!
//! Pure functions: a snapshot goes in, a validated value comes out. Invalid
//! input never fails the caller; it degrades to the documented default.
//!
//! | Key                        | Type | Default   |
//! |----------------------------|------|-----------|
//! | `event.trackingEnabled`    | bool | `true`    |
//! | `event.ringBufferCapacity` | u64  | `100000`  |
//! | `event.requestCapacity`    | u64  | `1000`    |
//!
//! Numeric keys: absent, non-numeric or zero ⇒ default; any other positive
//! integer is used verbatim.

use super::source::ConfigMap;
use crate::error::ConfigError;

/// Enables or disables event tracking.
pub const CM_EVENT_TRACKING_ENABLED: &str = "event.trackingEnabled";
/// Number of records the ring buffer retains.
pub const CM_EVENT_RING_BUFFER_CAPACITY: &str = "event.ringBufferCapacity";
/// Bound of the ingestion queue.
pub const CM_EVENT_REQUEST_CAPACITY: &str = "event.requestCapacity";

pub const DEFAULT_EVENT_TRACKING_ENABLED: bool = true;
pub const DEFAULT_EVENT_RING_BUFFER_CAPACITY: u64 = 100_000;
pub const DEFAULT_EVENT_REQUEST_CAPACITY: u64 = 1_000;

/// Parses a strictly positive capacity.
pub fn parse_capacity(map: &ConfigMap, key: &'static str) -> Result<u64, ConfigError> {
    let raw = map.get(key).ok_or(ConfigError::Missing { key })?;
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Zero { key }),
        Ok(n) => Ok(n),
        Err(_) => Err(ConfigError::Invalid {
            key,
            value: raw.clone(),
        }),
    }
}

/// Parses a boolean flag (`true`/`false`, case-insensitive, or `1`/`0`).
pub fn parse_flag(map: &ConfigMap, key: &'static str) -> Result<bool, ConfigError> {
    let raw = map.get(key).ok_or(ConfigError::Missing { key })?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.clone(),
        }),
    }
}

fn or_default<T: std::fmt::Debug>(res: Result<T, ConfigError>, default: T) -> T {
    match res {
        Ok(v) => v,
        Err(ConfigError::Missing { .. }) => default,
        Err(err) => {
            tracing::debug!(
                key = err.key(),
                reason = err.as_label(),
                ?default,
                "config value rejected, using default"
            );
            default
        }
    }
}

/// Bound of the ingestion queue.
pub fn get_request_capacity(map: &ConfigMap) -> u64 {
    or_default(
        parse_capacity(map, CM_EVENT_REQUEST_CAPACITY),
        DEFAULT_EVENT_REQUEST_CAPACITY,
    )
}

/// Capacity of the event ring buffer.
pub fn get_ring_buffer_capacity(map: &ConfigMap) -> u64 {
    or_default(
        parse_capacity(map, CM_EVENT_RING_BUFFER_CAPACITY),
        DEFAULT_EVENT_RING_BUFFER_CAPACITY,
    )
}

/// Whether events are tracked at all.
pub fn is_event_tracking_enabled(map: &ConfigMap) -> bool {
    or_default(
        parse_flag(map, CM_EVENT_TRACKING_ENABLED),
        DEFAULT_EVENT_TRACKING_ENABLED,
    )
}

/// The three dynamic settings, resolved together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSettings {
    pub tracking_enabled: bool,
    pub ring_buffer_capacity: u64,
    pub request_capacity: u64,
}

impl EventSettings {
    /// Resolves every setting from a snapshot.
    ///
    /// # Example
    /// ```
    /// use sched_events::{ConfigMap, EventSettings};
    ///
    /// let mut map = ConfigMap::new();
    /// map.insert("event.ringBufferCapacity".into(), "123".into());
    /// map.insert("event.requestCapacity".into(), "0".into());
    ///
    /// let s = EventSettings::resolve(&map);
    /// assert!(s.tracking_enabled);
    /// assert_eq!(s.ring_buffer_capacity, 123);
    /// assert_eq!(s.request_capacity, 1_000);
    /// ```
    pub fn resolve(map: &ConfigMap) -> Self {
        Self {
            tracking_enabled: is_event_tracking_enabled(map),
            ring_buffer_capacity: get_ring_buffer_capacity(map),
            request_capacity: get_request_capacity(map),
        }
    }
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            tracking_enabled: DEFAULT_EVENT_TRACKING_ENABLED,
            ring_buffer_capacity: DEFAULT_EVENT_RING_BUFFER_CAPACITY,
            request_capacity: DEFAULT_EVENT_REQUEST_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> ConfigMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_request_capacity() {
        let cfg = map(&[(CM_EVENT_REQUEST_CAPACITY, "123")]);
        assert_eq!(get_request_capacity(&cfg), 123);

        let cfg = map(&[(CM_EVENT_REQUEST_CAPACITY, "0")]);
        assert_eq!(get_request_capacity(&cfg), DEFAULT_EVENT_REQUEST_CAPACITY);

        let cfg = map(&[(CM_EVENT_REQUEST_CAPACITY, "xyz")]);
        assert_eq!(get_request_capacity(&cfg), DEFAULT_EVENT_REQUEST_CAPACITY);

        assert_eq!(
            get_request_capacity(&ConfigMap::new()),
            DEFAULT_EVENT_REQUEST_CAPACITY
        );
    }

    #[test]
    fn test_ring_buffer_capacity() {
        let cfg = map(&[(CM_EVENT_RING_BUFFER_CAPACITY, "123")]);
        assert_eq!(get_ring_buffer_capacity(&cfg), 123);

        let cfg = map(&[(CM_EVENT_RING_BUFFER_CAPACITY, "0")]);
        assert_eq!(
            get_ring_buffer_capacity(&cfg),
            DEFAULT_EVENT_RING_BUFFER_CAPACITY
        );

        let cfg = map(&[(CM_EVENT_RING_BUFFER_CAPACITY, "xyz")]);
        assert_eq!(
            get_ring_buffer_capacity(&cfg),
            DEFAULT_EVENT_RING_BUFFER_CAPACITY
        );

        let cfg = map(&[(CM_EVENT_RING_BUFFER_CAPACITY, "-5")]);
        assert_eq!(
            get_ring_buffer_capacity(&cfg),
            DEFAULT_EVENT_RING_BUFFER_CAPACITY
        );
    }

    #[test]
    fn test_tracking_enabled() {
        assert!(is_event_tracking_enabled(&ConfigMap::new()));

        let cfg = map(&[(CM_EVENT_TRACKING_ENABLED, "false")]);
        assert!(!is_event_tracking_enabled(&cfg));

        let cfg = map(&[(CM_EVENT_TRACKING_ENABLED, "FALSE")]);
        assert!(!is_event_tracking_enabled(&cfg));

        let cfg = map(&[(CM_EVENT_TRACKING_ENABLED, "maybe")]);
        assert!(is_event_tracking_enabled(&cfg));
    }

    #[test]
    fn test_parse_errors_are_typed() {
        let cfg = map(&[
            (CM_EVENT_REQUEST_CAPACITY, "0"),
            (CM_EVENT_RING_BUFFER_CAPACITY, "abc"),
        ]);

        assert_eq!(
            parse_capacity(&cfg, CM_EVENT_REQUEST_CAPACITY),
            Err(ConfigError::Zero {
                key: CM_EVENT_REQUEST_CAPACITY
            })
        );
        assert_eq!(
            parse_capacity(&cfg, CM_EVENT_RING_BUFFER_CAPACITY),
            Err(ConfigError::Invalid {
                key: CM_EVENT_RING_BUFFER_CAPACITY,
                value: "abc".into()
            })
        );
        assert_eq!(
            parse_flag(&cfg, CM_EVENT_TRACKING_ENABLED),
            Err(ConfigError::Missing {
                key: CM_EVENT_TRACKING_ENABLED
            })
        );
    }

    #[test]
    fn test_resolve_all() {
        let cfg = map(&[
            (CM_EVENT_TRACKING_ENABLED, "false"),
            (CM_EVENT_RING_BUFFER_CAPACITY, "123"),
            (CM_EVENT_REQUEST_CAPACITY, "555"),
        ]);
        assert_eq!(
            EventSettings::resolve(&cfg),
            EventSettings {
                tracking_enabled: false,
                ring_buffer_capacity: 123,
                request_capacity: 555,
            }
        );
        assert_eq!(
            EventSettings::resolve(&ConfigMap::new()),
            EventSettings::default()
        );
    }
}
