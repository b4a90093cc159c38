//! # Configuration source contract.
//!
//! The event system never owns configuration; it polls a [`ConfigSource`] for
//! a key/value snapshot and resolves the values it cares about. Any backing
//! store works (file watcher, config map mirror, test fixture) as long as a
//! snapshot is cheap and never blocks for long.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Raw key/value configuration snapshot.
pub type ConfigMap = HashMap<String, String>;

/// Pull-model configuration provider.
pub trait ConfigSource: Send + Sync + 'static {
    /// Returns the current snapshot.
    fn snapshot(&self) -> ConfigMap;
}

/// In-memory source whose snapshot can be replaced at any time.
///
/// # Example
/// ```
/// use sched_events::{ConfigSource, MapConfigSource};
///
/// let source = MapConfigSource::new();
/// assert!(source.snapshot().is_empty());
///
/// source.set([("event.requestCapacity", "555")]);
/// assert_eq!(source.snapshot()["event.requestCapacity"], "555");
/// ```
#[derive(Debug, Default)]
pub struct MapConfigSource {
    map: RwLock<ConfigMap>,
}

impl MapConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source holding `entries`.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let source = Self::new();
        source.set(entries);
        source
    }

    /// Replaces the whole snapshot.
    pub fn set<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        *self.map.write() = map;
    }
}

impl ConfigSource for MapConfigSource {
    fn snapshot(&self) -> ConfigMap {
        self.map.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_snapshot() {
        let source = MapConfigSource::with_entries([("a", "1"), ("b", "2")]);
        assert_eq!(source.snapshot().len(), 2);

        source.set([("c", "3")]);
        let snap = source.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap["c"], "3");

        source.set(Vec::<(String, String)>::new());
        assert!(source.snapshot().is_empty());
    }
}
