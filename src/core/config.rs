//! # Static runtime configuration.
//!
//! [`EventSystemConfig`] holds the settings fixed for the lifetime of an
//! [`EventSystemImpl`](crate::EventSystemImpl): how often background tasks
//! wake up and how much the publisher reads per step.
//!
//! Capacities and the tracking flag are **not** here; they are dynamic and come
//! from a [`ConfigSource`](crate::ConfigSource), see [`crate::resolver`].
//!
//! ## Sentinel values
//! - `publish_interval = 0s` / `refresh_interval = 0s` → clamped to 1ms
//! - `publish_batch = 0` → clamped to 1

use std::time::Duration;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Timing and batching settings for the background tasks.
///
/// ## Field semantics
/// - `publish_interval`: Period of the publisher cycle
/// - `refresh_interval`: Period of the configuration poll
/// - `publish_batch`: Maximum records read from the store per publisher step
#[derive(Clone, Debug)]
pub struct EventSystemConfig {
    /// How often newly stored records are pushed to streams.
    pub publish_interval: Duration,

    /// How often the configuration source is polled.
    ///
    /// Capacity and flag changes become visible at most one interval after
    /// the source changes.
    pub refresh_interval: Duration,

    /// Records read from the store per publisher step.
    ///
    /// A cycle keeps stepping until it has caught up with the store, so this
    /// only bounds the size of one intermediate copy.
    pub publish_batch: u64,
}

impl EventSystemConfig {
    #[inline]
    pub fn publish_interval_clamped(&self) -> Duration {
        self.publish_interval.max(MIN_INTERVAL)
    }

    #[inline]
    pub fn refresh_interval_clamped(&self) -> Duration {
        self.refresh_interval.max(MIN_INTERVAL)
    }

    #[inline]
    pub fn publish_batch_clamped(&self) -> u64 {
        self.publish_batch.max(1)
    }
}

impl Default for EventSystemConfig {
    /// Default configuration:
    ///
    /// - `publish_interval = 1s`
    /// - `refresh_interval = 1s`
    /// - `publish_batch = 1000`
    fn default() -> Self {
        Self {
            publish_interval: Duration::from_secs(1),
            refresh_interval: Duration::from_secs(1),
            publish_batch: 1000,
        }
    }
}
