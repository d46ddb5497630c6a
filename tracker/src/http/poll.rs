//! Long-running resource polling
//!
//! Repeatedly fetches a resource and lets the caller decide after each
//! attempt whether to stop or to try again after a fixed interval.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use crate::errors::TrackerError;

/// Outcome of inspecting one poll attempt
#[derive(Debug)]
pub enum PollDecision<T> {
    /// Fetch again after the interval
    Retry,

    /// Stop with a value
    Finish(T),

    /// Stop with an error
    Fail(TrackerError),
}

/// Poll until `decide` finishes or fails, or until `shutdown_signal` resolves.
///
/// `decide` sees every attempt's result, errors included, so the caller
/// chooses which failures are transient.
pub async fn poll_until<T, R, Fetch, FetchFut, Decide, Sl, SlFut>(
    interval: Duration,
    mut fetch: Fetch,
    mut decide: Decide,
    sleep_fn: Sl,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) -> Result<T, TrackerError>
where
    Fetch: FnMut() -> FetchFut,
    FetchFut: Future<Output = Result<R, TrackerError>>,
    Decide: FnMut(Result<R, TrackerError>) -> PollDecision<T>,
    Sl: Fn(Duration) -> SlFut,
    SlFut: Future<Output = ()>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;

        let result = tokio::select! {
            biased;
            _ = &mut shutdown_signal => return Err(TrackerError::Cancelled),
            result = fetch() => result,
        };

        match decide(result) {
            PollDecision::Finish(value) => return Ok(value),
            PollDecision::Fail(e) => return Err(e),
            PollDecision::Retry => {
                debug!("Poll attempt {} not finished, retrying in {:?}", attempt, interval);
            }
        }

        tokio::select! {
            biased;
            _ = &mut shutdown_signal => return Err(TrackerError::Cancelled),
            _ = sleep_fn(interval) => {}
        }
    }
}
