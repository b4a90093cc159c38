//! # Ingestion consumer.
//!
//! The only writer of the [`EventStore`]: drains the ingestion queue and adds
//! records one by one, so IDs follow dequeue order.
//!
//! Exits when its token is cancelled or the queue's producer side is gone.
//! Records still buffered at cancellation are discarded with the instance.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::ingest::IngestReceiver;
use crate::store::EventStore;

pub(crate) async fn run(mut rx: IngestReceiver, store: Arc<EventStore>, token: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            record = rx.recv() => match record {
                Some(record) => {
                    store.add(record);
                }
                None => break,
            },
        }
    }
    tracing::debug!(stored = store.count_stored_events(), "ingestion consumer stopped");
}
