//! # Event system: lifecycle, ingestion and query surface.
//!
//! [`EventSystemImpl`] owns the store, the ingestion queue, the stream
//! registry and the three background tasks. Production code talks to it
//! through the [`EventSystem`] trait; tests and introspection tooling use the
//! concrete type, which additionally exposes the store and lifecycle state.
//!
//! ## Lifecycle
//! ```text
//!   new() ──► NotStarted ──start_service()──► Running ──stop()──► Stopped
//!                 │                                                 ▲
//!                 └──────────────────── stop() ─────────────────────┘
//! ```
//! `Stopped` is terminal; a fresh instance comes from
//! [`EventContext::init`](crate::EventContext::init).
//!
//! ## Background tasks
//! ```text
//! start_service_with_publisher(p)
//!   ├─► consumer   IngestReceiver ──► EventStore::add
//!   ├─► publisher  EventStore ──► StreamRegistry::broadcast   (only if p)
//!   └─► refresh    ConfigSource ──► reconfigure / resize / flag
//!
//! stop()
//!   └─► token.cancel() ──► join all ──► StreamRegistry::close_all
//! ```
//!
//! ## Rules
//! - `add_event` never blocks and never fails; it drops the record when the
//!   system is not running, tracking is disabled, or the queue is full.
//! - `stop` is idempotent; every caller returns only after the tasks are joined.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::EventSystemConfig;
use super::consumer;
use super::publisher::Publisher;
use super::refresh::ConfigRefresher;
use crate::events::EventRecord;
use crate::ingest::{IngestQueue, IngestReceiver};
use crate::resolver::{ConfigSource, EventSettings};
use crate::store::EventStore;
use crate::streams::{EventStream, StreamInfo, StreamRegistry};

/// Lifecycle state of an event system instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Lifecycle {
    NotStarted = 0,
    Running = 1,
    Stopped = 2,
}

impl Lifecycle {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Lifecycle::NotStarted,
            1 => Lifecycle::Running,
            _ => Lifecycle::Stopped,
        }
    }
}

/// Stable public surface of the event system.
///
/// Held as `Arc<dyn EventSystem>` by the scheduler and anything that only
/// records or reads events.
#[async_trait]
pub trait EventSystem: Send + Sync {
    /// Submits a record. `None` is accepted and ignored.
    fn add_event(&self, record: Option<EventRecord>);

    /// Starts ingestion, publishing and config refresh.
    fn start_service(&self);

    /// Stops every background task and waits for them to finish.
    async fn stop(&self);

    /// Currently applied tracking flag; follows config refresh.
    fn is_event_tracking_enabled(&self) -> bool;

    /// Currently applied ring buffer capacity; follows config refresh.
    fn get_ring_buffer_capacity(&self) -> u64;

    /// Currently applied ingestion queue capacity; follows config refresh.
    fn get_request_capacity(&self) -> u64;

    /// See [`EventStore::get_events_from_id`].
    fn get_events_from_id(&self, id: u64, count: u64) -> (Vec<EventRecord>, u64, u64);

    /// Creates a stream that receives every record published from now on.
    fn create_event_stream(&self, name: &str, capacity: u64) -> EventStream;

    /// Closes and unregisters a stream.
    fn remove_event_stream(&self, stream: &EventStream) -> bool;

    /// Lists the open streams.
    fn get_event_streams(&self) -> Vec<StreamInfo>;
}

/// The event system.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use sched_events::{EventRecord, EventSystem, EventSystemConfig, EventSystemImpl, EventType, MapConfigSource};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let system = EventSystemImpl::new(EventSystemConfig::default(), Arc::new(MapConfigSource::new()));
///     system.start_service_with_publisher(false);
///
///     system.add_event(Some(EventRecord::new(EventType::Request, "alloc1", "app1", "message")));
///     while system.store().count_stored_events() == 0 {
///         tokio::time::sleep(Duration::from_millis(1)).await;
///     }
///
///     let (records, lowest, highest) = system.get_events_from_id(0, 10);
///     assert_eq!((records.len(), lowest, highest), (1, 0, 0));
///     system.stop().await;
/// }
/// ```
pub struct EventSystemImpl {
    cfg: EventSystemConfig,
    source: Arc<dyn ConfigSource>,
    store: Arc<EventStore>,
    queue: Arc<IngestQueue>,
    receiver: Mutex<Option<IngestReceiver>>,
    streams: Arc<StreamRegistry>,
    tracking_enabled: Arc<AtomicBool>,
    state: AtomicU8,
    token: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stop_gate: tokio::sync::Mutex<()>,
}

impl EventSystemImpl {
    /// Creates an instance in [`Lifecycle::NotStarted`], sized from the
    /// source's current snapshot.
    pub fn new(cfg: EventSystemConfig, source: Arc<dyn ConfigSource>) -> Self {
        let settings = EventSettings::resolve(&source.snapshot());
        let (queue, receiver) = IngestQueue::new(settings.request_capacity);

        tracing::debug!(
            tracking_enabled = settings.tracking_enabled,
            ring_buffer_capacity = settings.ring_buffer_capacity,
            request_capacity = settings.request_capacity,
            "event system initialised"
        );

        Self {
            cfg,
            source,
            store: Arc::new(EventStore::new(settings.ring_buffer_capacity)),
            queue: Arc::new(queue),
            receiver: Mutex::new(Some(receiver)),
            streams: Arc::new(StreamRegistry::new()),
            tracking_enabled: Arc::new(AtomicBool::new(settings.tracking_enabled)),
            state: AtomicU8::new(Lifecycle::NotStarted as u8),
            token: CancellationToken::new(),
            workers: Mutex::new(Vec::new()),
            stop_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> Lifecycle {
        Lifecycle::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Direct access to the ring buffer.
    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Records rejected because the ingestion queue was full.
    pub fn dropped_events(&self) -> u64 {
        self.queue.dropped()
    }

    /// Starts the service; the publisher only runs if `publisher` is `true`.
    ///
    /// With the publisher off, ingestion and storage behave exactly the same
    /// but no record ever reaches a stream.
    ///
    /// No-op unless the instance is [`Lifecycle::NotStarted`], or when called
    /// outside a tokio runtime.
    pub fn start_service_with_publisher(&self, publisher: bool) {
        let Ok(rt) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime available; event system not started");
            return;
        };
        if self
            .state
            .compare_exchange(
                Lifecycle::NotStarted as u8,
                Lifecycle::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            tracing::debug!(state = ?self.state(), "event system start ignored");
            return;
        }

        let mut workers = self.workers.lock();
        // A concurrent stop() won the race after our transition.
        if self.token.is_cancelled() {
            return;
        }
        let Some(receiver) = self.receiver.lock().take() else {
            return;
        };

        workers.push(rt.spawn(consumer::run(
            receiver,
            Arc::clone(&self.store),
            self.token.child_token(),
        )));

        if publisher {
            let publisher = Publisher::new(
                Arc::clone(&self.store),
                Arc::clone(&self.streams),
                self.cfg.publish_interval_clamped(),
                self.cfg.publish_batch_clamped(),
            );
            workers.push(rt.spawn(publisher.run(self.token.child_token())));
        }

        let refresher = ConfigRefresher::new(
            Arc::clone(&self.source),
            Arc::clone(&self.store),
            Arc::clone(&self.queue),
            Arc::clone(&self.tracking_enabled),
            self.cfg.refresh_interval_clamped(),
        );
        workers.push(rt.spawn(refresher.run(self.token.child_token())));

        tracing::info!(publisher, "event system started");
    }
}

#[async_trait]
impl EventSystem for EventSystemImpl {
    fn add_event(&self, record: Option<EventRecord>) {
        let Some(record) = record else {
            return;
        };
        if self.state() != Lifecycle::Running || !self.tracking_enabled.load(Ordering::Acquire) {
            return;
        }
        if !self.queue.try_push(record) {
            tracing::trace!("ingestion queue full; event dropped");
        }
    }

    fn start_service(&self) {
        self.start_service_with_publisher(true);
    }

    async fn stop(&self) {
        let _gate = self.stop_gate.lock().await;

        let previous = Lifecycle::from_u8(
            self.state
                .swap(Lifecycle::Stopped as u8, Ordering::AcqRel),
        );
        if previous == Lifecycle::Stopped {
            return;
        }

        self.token.cancel();
        let workers = std::mem::take(&mut *self.workers.lock());
        for res in futures::future::join_all(workers).await {
            if let Err(err) = res {
                tracing::warn!(error = %err, "event system task ended abnormally");
            }
        }
        self.streams.close_all();

        tracing::info!(?previous, stored = self.store.count_stored_events(), "event system stopped");
    }

    fn is_event_tracking_enabled(&self) -> bool {
        self.tracking_enabled.load(Ordering::Acquire)
    }

    fn get_ring_buffer_capacity(&self) -> u64 {
        self.store.capacity()
    }

    fn get_request_capacity(&self) -> u64 {
        self.queue.capacity()
    }

    fn get_events_from_id(&self, id: u64, count: u64) -> (Vec<EventRecord>, u64, u64) {
        self.store.get_events_from_id(id, count)
    }

    fn create_event_stream(&self, name: &str, capacity: u64) -> EventStream {
        self.streams.create(name, capacity)
    }

    fn remove_event_stream(&self, stream: &EventStream) -> bool {
        self.streams.remove(stream)
    }

    fn get_event_streams(&self) -> Vec<StreamInfo> {
        self.streams.list()
    }
}

impl Drop for EventSystemImpl {
    fn drop(&mut self) {
        // Tasks cannot be joined here; make sure they at least wind down.
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::events::EventType;
    use crate::resolver::{
        CM_EVENT_REQUEST_CAPACITY, CM_EVENT_RING_BUFFER_CAPACITY, CM_EVENT_TRACKING_ENABLED,
        DEFAULT_EVENT_REQUEST_CAPACITY, DEFAULT_EVENT_RING_BUFFER_CAPACITY, MapConfigSource,
    };
    use crate::testing::wait_for_condition;

    fn fast_config() -> EventSystemConfig {
        EventSystemConfig {
            publish_interval: Duration::from_millis(5),
            refresh_interval: Duration::from_millis(10),
            publish_batch: 100,
        }
    }

    fn system_with(source: Arc<MapConfigSource>) -> EventSystemImpl {
        EventSystemImpl::new(fast_config(), source)
    }

    fn system() -> EventSystemImpl {
        system_with(Arc::new(MapConfigSource::new()))
    }

    fn request(msg: impl Into<String>) -> EventRecord {
        EventRecord::new(EventType::Request, "alloc1", "app1", msg)
    }

    #[tokio::test]
    async fn test_simple_start_and_stop() {
        let system = system();
        system.add_event(None);
        system.start_service();
        system.add_event(None);
        system.stop().await;
        system.add_event(None);
        system.stop().await;

        assert_eq!(system.state(), Lifecycle::Stopped);
    }

    #[tokio::test]
    async fn test_stop_before_start_is_terminal() {
        let system = system();
        system.stop().await;
        assert_eq!(system.state(), Lifecycle::Stopped);

        system.start_service();
        assert_eq!(system.state(), Lifecycle::Stopped);
        system.stop().await;
    }

    #[tokio::test]
    async fn test_double_start_is_ignored() {
        let system = system();
        system.start_service();
        system.start_service_with_publisher(false);
        assert_eq!(system.state(), Lifecycle::Running);
        assert_eq!(system.workers.lock().len(), 3);
        system.stop().await;
        assert!(system.workers.lock().is_empty());
    }

    #[test]
    fn test_start_without_runtime_is_noop() {
        let system = system();
        system.start_service();
        assert_eq!(system.state(), Lifecycle::NotStarted);
    }

    #[tokio::test]
    async fn test_concurrent_stops_all_wait() {
        let system = Arc::new(system());
        system.start_service();

        let a = {
            let s = Arc::clone(&system);
            tokio::spawn(async move { s.stop().await })
        };
        let b = {
            let s = Arc::clone(&system);
            tokio::spawn(async move { s.stop().await })
        };
        a.await.unwrap();
        b.await.unwrap();

        assert_eq!(system.state(), Lifecycle::Stopped);
        assert!(system.workers.lock().is_empty());
    }

    #[tokio::test]
    async fn test_events_dropped_unless_running() {
        let system = system();
        system.add_event(Some(request("before")));
        system.start_service_with_publisher(false);
        system.add_event(Some(request("during")));

        wait_for_condition(Duration::from_millis(1), Duration::from_secs(1), || {
            system.store().count_stored_events() == 1
        })
        .await
        .expect("the event should have been processed");
        system.stop().await;

        system.add_event(Some(request("after")));
        let records = system.store().collect_events();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "during");
    }

    #[tokio::test]
    async fn test_single_event_stored_correctly() {
        let system = system();
        system.start_service_with_publisher(false);

        system.add_event(Some(request("message")));
        wait_for_condition(Duration::from_millis(1), Duration::from_secs(1), || {
            system.store().count_stored_events() == 1
        })
        .await
        .expect("the event should have been processed");

        let records = system.store().collect_events();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.event_type, EventType::Request);
        assert_eq!(record.object_id, "alloc1");
        assert_eq!(record.reference_id, "app1");
        assert_eq!(record.message, "message");

        system.stop().await;
    }

    #[tokio::test]
    async fn test_get_events() {
        let system = system();
        system.start_service_with_publisher(false);

        for i in 0..10 {
            system.add_event(Some(request(i.to_string())));
        }
        wait_for_condition(Duration::from_millis(1), Duration::from_secs(1), || {
            system.store().count_stored_events() == 10
        })
        .await
        .expect("the events should have been processed");

        let (records, lowest, highest) = system.get_events_from_id(3, 3);
        assert_eq!(lowest, 0);
        assert_eq!(highest, 9);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].message, "3");
        assert_eq!(records[1].message, "4");
        assert_eq!(records[2].message, "5");

        system.stop().await;
    }

    #[tokio::test]
    async fn test_config_update() {
        let source = Arc::new(MapConfigSource::new());
        let system = system_with(Arc::clone(&source));
        system.start_service();

        assert!(system.is_event_tracking_enabled());
        assert_eq!(system.get_ring_buffer_capacity(), DEFAULT_EVENT_RING_BUFFER_CAPACITY);
        assert_eq!(system.get_request_capacity(), DEFAULT_EVENT_REQUEST_CAPACITY);
        assert_eq!(system.store().capacity(), DEFAULT_EVENT_RING_BUFFER_CAPACITY);

        source.set([
            (CM_EVENT_TRACKING_ENABLED, "false"),
            (CM_EVENT_RING_BUFFER_CAPACITY, "123"),
            (CM_EVENT_REQUEST_CAPACITY, "555"),
        ]);
        wait_for_condition(Duration::from_millis(10), Duration::from_secs(5), || {
            !system.is_event_tracking_enabled()
        })
        .await
        .expect("timed out waiting for config refresh");

        assert_eq!(system.get_ring_buffer_capacity(), 123);
        assert_eq!(system.get_request_capacity(), 555);
        assert_eq!(system.store().capacity(), 123);

        system.stop().await;
    }

    #[tokio::test]
    async fn test_initial_capacities_come_from_source() {
        let source = Arc::new(MapConfigSource::with_entries([
            (CM_EVENT_RING_BUFFER_CAPACITY, "7"),
            (CM_EVENT_REQUEST_CAPACITY, "3"),
        ]));
        let system = system_with(source);

        assert_eq!(system.get_ring_buffer_capacity(), 7);
        assert_eq!(system.get_request_capacity(), 3);
    }

    #[tokio::test]
    async fn test_tracking_disabled_drops_events() {
        let source = Arc::new(MapConfigSource::with_entries([(
            CM_EVENT_TRACKING_ENABLED,
            "false",
        )]));
        let system = system_with(source);
        system.start_service_with_publisher(false);

        system.add_event(Some(request("ignored")));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(system.store().count_stored_events(), 0);

        system.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_producers_store_every_event() {
        const PRODUCERS: usize = 8;
        const PER_PRODUCER: usize = 250;
        const TOTAL: u64 = (PRODUCERS * PER_PRODUCER) as u64;

        let source = Arc::new(MapConfigSource::with_entries([(
            CM_EVENT_REQUEST_CAPACITY,
            "4000",
        )]));
        let system = Arc::new(system_with(source));
        system.start_service_with_publisher(false);

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let system = Arc::clone(&system);
                tokio::spawn(async move {
                    for i in 0..PER_PRODUCER {
                        system.add_event(Some(request(format!("{p}-{i}"))));
                    }
                })
            })
            .collect();
        for res in futures::future::join_all(producers).await {
            res.expect("producer should not panic");
        }
        assert_eq!(system.dropped_events(), 0);

        wait_for_condition(Duration::from_millis(1), Duration::from_secs(5), || {
            system.store().count_stored_events() == TOTAL
        })
        .await
        .expect("every submitted event should be stored");

        let (records, lowest, highest) = system.get_events_from_id(0, TOTAL);
        assert_eq!((lowest, highest), (0, TOTAL - 1));
        assert_eq!(records.len() as u64, TOTAL);

        let mut messages: Vec<_> = records.into_iter().map(|r| r.message).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len() as u64, TOTAL);

        system.stop().await;
    }

    #[tokio::test]
    async fn test_full_queue_drops_records() {
        let source = Arc::new(MapConfigSource::with_entries([(
            CM_EVENT_REQUEST_CAPACITY,
            "2",
        )]));
        let system = system_with(source);
        system.start_service_with_publisher(false);

        // Current-thread runtime: the consumer cannot run between these calls.
        for i in 0..5 {
            system.add_event(Some(request(i.to_string())));
        }
        assert_eq!(system.dropped_events(), 3);

        wait_for_condition(Duration::from_millis(1), Duration::from_secs(1), || {
            system.store().count_stored_events() == 2
        })
        .await
        .expect("queued records should be stored");

        system.stop().await;
    }

    #[tokio::test]
    async fn test_event_streaming() {
        let system = system();
        system.start_service();

        let _stream = system.create_event_stream("test", 10);
        let streams = system.get_event_streams();

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].name, "test");

        system.stop().await;
    }

    #[tokio::test]
    async fn test_stream_receives_published_records() {
        let system = system();
        system.start_service();
        let stream = system.create_event_stream("tail", 10);

        for i in 0..3 {
            system.add_event(Some(request(i.to_string())));
        }

        let mut got = Vec::new();
        for _ in 0..3 {
            let record = tokio::time::timeout(Duration::from_secs(1), stream.recv())
                .await
                .expect("record should be published")
                .expect("stream should be open");
            got.push(record.message);
        }
        assert_eq!(got, vec!["0", "1", "2"]);

        system.stop().await;
        assert!(stream.is_closed());
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_publisher_disabled_never_reaches_streams() {
        let system = system();
        system.start_service_with_publisher(false);
        let stream = system.create_event_stream("tail", 10);

        system.add_event(Some(request("x")));
        wait_for_condition(Duration::from_millis(1), Duration::from_secs(1), || {
            system.store().count_stored_events() == 1
        })
        .await
        .expect("the event should have been processed");
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(stream.is_empty());
        system.stop().await;
    }

    #[tokio::test]
    async fn test_remove_event_stream() {
        let system = system();
        let a = system.create_event_stream("a", 1);
        let _b = system.create_event_stream("b", 1);

        assert!(system.remove_event_stream(&a));
        let names: Vec<_> = system.get_event_streams().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["b"]);
    }

    #[tokio::test]
    async fn test_usable_through_trait_object() {
        let system: Arc<dyn EventSystem> = Arc::new(system());
        system.add_event(None);
        system.start_service();
        system.add_event(Some(request("dyn")));
        system.stop().await;
        system.stop().await;
    }
}
