use std::time::Duration;

/// Suspend the current task for at least `duration`.
pub async fn delay(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
