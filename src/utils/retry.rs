// Retry with exponential backoff

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Run `operation`, retrying up to `retries` more times while `should_retry`
/// accepts the error. Delays double from 2s and cap at 32s.
pub async fn with_retry<F, Fut, T, E, P>(
    mut operation: F,
    retries: u32,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if attempt >= retries || !should_retry(&error) {
                    return Err(error);
                }
                attempt += 1;

                let delay = backoff(attempt);
                warn!(attempt, delay_secs = delay.as_secs(), %error, "Retrying after error");
                sleep(delay).await;
            }
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.pow(attempt.min(5)))
}
