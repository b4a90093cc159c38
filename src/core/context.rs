//! # Event system context.
//!
//! [`EventContext`] is the owner of "the" event system of a scheduler process.
//! It is constructed once, injected where needed, and can be re-initialised to
//! obtain a clean instance:
//!
//! ```text
//! EventContext::new(cfg, source)      ──► instance #1 (NotStarted)
//! ctx.get_event_system().start_service()
//! ctx.init().await                    ──► stop #1, instance #2 (NotStarted)
//! ```
//!
//! Handles obtained before a re-init keep pointing at the old (stopped)
//! instance.

use std::sync::Arc;

use parking_lot::RwLock;

use super::config::EventSystemConfig;
use super::system::{EventSystem, EventSystemImpl};
use crate::resolver::ConfigSource;

/// Owner of the current [`EventSystemImpl`].
pub struct EventContext {
    cfg: EventSystemConfig,
    source: Arc<dyn ConfigSource>,
    current: RwLock<Arc<EventSystemImpl>>,
}

impl EventContext {
    /// Creates the context with a fresh, not yet started instance.
    pub fn new(cfg: EventSystemConfig, source: Arc<dyn ConfigSource>) -> Self {
        let current = Arc::new(EventSystemImpl::new(cfg.clone(), Arc::clone(&source)));
        Self {
            cfg,
            source,
            current: RwLock::new(current),
        }
    }

    /// Stops the current instance and replaces it with a fresh one.
    ///
    /// Capacities are resolved from the source's snapshot at the time of the
    /// call. Store contents and streams of the old instance are discarded.
    pub async fn init(&self) {
        let fresh = Arc::new(EventSystemImpl::new(self.cfg.clone(), Arc::clone(&self.source)));
        let old = std::mem::replace(&mut *self.current.write(), fresh);
        old.stop().await;
    }

    /// Stable handle to the current instance.
    pub fn get_event_system(&self) -> Arc<dyn EventSystem> {
        self.current.read().clone()
    }

    /// Concrete handle to the current instance, for introspection.
    pub fn get_impl(&self) -> Arc<EventSystemImpl> {
        Arc::clone(&self.current.read())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::system::Lifecycle;
    use crate::events::{EventRecord, EventType};
    use crate::resolver::{CM_EVENT_RING_BUFFER_CAPACITY, MapConfigSource};
    use crate::testing::wait_for_condition;

    fn context(source: Arc<MapConfigSource>) -> EventContext {
        let cfg = EventSystemConfig {
            refresh_interval: Duration::from_millis(10),
            ..EventSystemConfig::default()
        };
        EventContext::new(cfg, source)
    }

    #[tokio::test]
    async fn test_handles_share_one_instance() {
        let ctx = context(Arc::new(MapConfigSource::new()));
        let handle = ctx.get_event_system();
        handle.start_service();

        assert_eq!(ctx.get_impl().state(), Lifecycle::Running);
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_init_discards_previous_state() {
        let source = Arc::new(MapConfigSource::new());
        let ctx = context(Arc::clone(&source));

        let first = ctx.get_impl();
        first.start_service_with_publisher(false);
        let _stream = first.create_event_stream("old", 4);
        first.add_event(Some(EventRecord::new(EventType::Queue, "root", "", "old")));
        wait_for_condition(Duration::from_millis(1), Duration::from_secs(1), || {
            first.store().count_stored_events() == 1
        })
        .await
        .expect("the event should have been processed");

        source.set([(CM_EVENT_RING_BUFFER_CAPACITY, "42")]);
        ctx.init().await;

        assert_eq!(first.state(), Lifecycle::Stopped);
        let second = ctx.get_impl();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.state(), Lifecycle::NotStarted);
        assert_eq!(second.store().count_stored_events(), 0);
        assert!(second.get_event_streams().is_empty());
        assert_eq!(second.get_ring_buffer_capacity(), 42);
    }
}
