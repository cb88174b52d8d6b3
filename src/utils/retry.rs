use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Fixed-backoff retry.
///
/// Runs `operation` up to `max_attempts` times. Every failed attempt except the
/// last is followed by a `backoff` sleep. Returns the first success, or the
/// last error once attempts are exhausted.
///
/// # Arguments
/// * `label` - what is being retried, for log lines
/// * `max_attempts` - total attempts including the first (at least 1)
/// * `backoff` - sleep between a failed attempt and the next one
/// * `operation` - async closure, called once per attempt with the 1-based attempt number
pub async fn retry_fixed<F, Fut, T>(
    label: &str,
    max_attempts: u32,
    backoff: Duration,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(val) => return Ok(val),
            Err(e) if attempt >= max_attempts => return Err(e),
            Err(e) => {
                log::warn!(
                    "Attempt {} failed for {}: {}; retrying in {:.1}s",
                    attempt,
                    label,
                    e,
                    backoff.as_secs_f64()
                );
                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}
