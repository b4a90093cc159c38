//! Tails an event stream while a fake scheduler produces events.
//!
//! Run with: `RUST_LOG=debug cargo run --example tail`

use std::sync::Arc;
use std::time::Duration;

use sched_events::{
    ChangeDetail, ChangeType, EventContext, EventRecord, EventSystem, EventSystemConfig,
    EventType, MapConfigSource,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let source = Arc::new(MapConfigSource::with_entries([("event.requestCapacity", "64")]));
    let cfg = EventSystemConfig {
        publish_interval: Duration::from_millis(50),
        refresh_interval: Duration::from_millis(200),
        ..EventSystemConfig::default()
    };
    let ctx = EventContext::new(cfg, source.clone());
    let events = ctx.get_event_system();
    events.start_service();

    let stream = events.create_event_stream("tail", 16);

    let producer = {
        let events = Arc::clone(&events);
        tokio::spawn(async move {
            for i in 0..10 {
                let app = format!("app-{i}");
                events.add_event(Some(
                    EventRecord::new(EventType::App, &app, "root.default", "submitted")
                        .with_change(ChangeType::Add, ChangeDetail::AppNew),
                ));
                events.add_event(Some(
                    EventRecord::new(EventType::Request, format!("alloc-{i}"), &app, "allocated")
                        .with_change(ChangeType::Add, ChangeDetail::RequestAlloc),
                ));
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
    };

    // Shrink the ring buffer while running.
    source.set([("event.requestCapacity", "64"), ("event.ringBufferCapacity", "8")]);

    let mut seen = 0;
    while seen < 20 {
        match tokio::time::timeout(Duration::from_secs(2), stream.recv()).await {
            Ok(Some(ev)) => {
                seen += 1;
                println!(
                    "{:>3} {:<8} {:<10} ref={:<12} {:?} {}",
                    seen, ev.event_type, ev.object_id, ev.reference_id, ev.change_detail, ev.message
                );
            }
            Ok(None) | Err(_) => break,
        }
    }
    if let Err(err) = producer.await {
        tracing::warn!(error = %err, "producer task failed");
    }

    let (records, lowest, highest) = events.get_events_from_id(0, 100);
    println!(
        "store: {} records retained, ids {lowest}..={highest}, ring capacity {}",
        records.len(),
        events.get_ring_buffer_capacity()
    );
    for info in events.get_event_streams() {
        println!("stream {} queued={} dropped={}", info.name, info.queued, info.dropped);
    }

    events.stop().await;
}
