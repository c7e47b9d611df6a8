//! Deadlines for external calls.

use std::future::Future;
use std::time::Duration;

/// Run a fallible future under a deadline. On expiry the error is built by
/// `on_timeout` from the limit that was exceeded.
pub async fn with_deadline<F, T, E>(
    limit: Duration,
    fut: F,
    on_timeout: impl FnOnce(Duration) -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(limit)),
    }
}
