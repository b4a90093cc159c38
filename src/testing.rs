//! Test helpers.

use std::time::Duration;

use tokio::time::error::Elapsed;

/// Polls `condition` every `interval` until it holds or `timeout` elapses.
pub(crate) async fn wait_for_condition(
    interval: Duration,
    timeout: Duration,
    mut condition: impl FnMut() -> bool,
) -> Result<(), Elapsed> {
    tokio::time::timeout(timeout, async {
        while !condition() {
            tokio::time::sleep(interval).await;
        }
    })
    .await
}
