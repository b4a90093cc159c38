//! Error types used by the event-tracking runtime.
//!
//! Nothing on the ingestion or query path fails under normal operation, so the
//! set is small:
//!
//! - [`ConfigError`]: why a raw configuration value was rejected. The resolver
//!   never surfaces it to callers; it falls back to the default and logs it.
//! - [`StreamError`]: returned by non-blocking stream reads.
//!
//! Both types provide `as_label` for logs/metrics.

use thiserror::Error;

/// # Reasons a configuration value could not be used.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Key is not present in the snapshot.
    #[error("key {key} is not set")]
    Missing {
        /// The configuration key.
        key: &'static str,
    },

    /// Value could not be parsed into the expected type.
    #[error("key {key} has invalid value {value:?}")]
    Invalid {
        /// The configuration key.
        key: &'static str,
        /// The raw value as found in the snapshot.
        value: String,
    },

    /// Value parsed but zero is not an allowed capacity.
    #[error("key {key} must be greater than zero")]
    Zero {
        /// The configuration key.
        key: &'static str,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use sched_events::ConfigError;
    ///
    /// let err = ConfigError::Zero { key: "event.requestCapacity" };
    /// assert_eq!(err.as_label(), "config_zero");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Missing { .. } => "config_missing",
            ConfigError::Invalid { .. } => "config_invalid",
            ConfigError::Zero { .. } => "config_zero",
        }
    }

    /// Returns the key the error refers to.
    pub fn key(&self) -> &'static str {
        match self {
            ConfigError::Missing { key }
            | ConfigError::Invalid { key, .. }
            | ConfigError::Zero { key } => *key,
        }
    }
}

/// # Errors produced by non-blocking stream reads.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// Stream is open but nothing is queued right now.
    #[error("stream is empty")]
    Empty,

    /// Stream was closed and every queued record has been read.
    #[error("stream is closed")]
    Closed,
}

impl StreamError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StreamError::Empty => "stream_empty",
            StreamError::Closed => "stream_closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_labels_and_keys() {
        let missing = ConfigError::Missing { key: "a" };
        let invalid = ConfigError::Invalid {
            key: "b",
            value: "xyz".into(),
        };
        let zero = ConfigError::Zero { key: "c" };

        assert_eq!(missing.as_label(), "config_missing");
        assert_eq!(invalid.as_label(), "config_invalid");
        assert_eq!(zero.as_label(), "config_zero");

        assert_eq!(missing.key(), "a");
        assert_eq!(invalid.key(), "b");
        assert_eq!(zero.key(), "c");
        assert_eq!(invalid.to_string(), "key b has invalid value \"xyz\"");
    }

    #[test]
    fn test_stream_error_labels() {
        assert_eq!(StreamError::Empty.as_label(), "stream_empty");
        assert_eq!(StreamError::Closed.as_label(), "stream_closed");
    }
}
