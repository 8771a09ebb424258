//! Bounded retry with exponential backoff for external API calls
//!
//! The AWS adapters wrap each SDK call with this helper so that a
//! transient API failure does not abort an otherwise healthy run.
//! Attempts are bounded; the last error is returned once the budget is
//! exhausted.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Run `call` up to `MAX_ATTEMPTS` times, doubling the delay between
/// attempts. Designed-in non-errors (e.g. a missing store parameter
/// mapped to `Ok(None)`) must be handled inside `call` so they are not
/// retried.
pub async fn with_backoff<T, E, F, Fut>(operation: &str, mut call: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut delay = INITIAL_BACKOFF;
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_ATTEMPTS => {
                warn!(operation, attempt, error = %err, "call failed, backing off before retry");
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
