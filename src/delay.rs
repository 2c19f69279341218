use std::time::Duration;

/// Completes after `duration_ms` milliseconds.
pub async fn delay(duration_ms: u64) {
    tokio::time::sleep(Duration::from_millis(duration_ms)).await;
}
