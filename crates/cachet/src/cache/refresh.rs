//! Per-key background refresh.
//!
//! A refresh task is armed by a read-through lookup that requested it, and
//! lives exactly as long as its entry: removing, overwriting, or clearing the
//! entry cancels the task before the operation returns. The loop sleeps for
//! the current interval, re-invokes the producer, and stores the result.
//! Producer failures leave the cached value untouched and switch the next
//! sleep to the failure interval (when one is configured); the next success
//! reverts to the normal interval.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::config::GetAndSetOptions;
use super::core::WeakCache;
use super::key::CacheKey;
use crate::clock::Clock;
use crate::error::BoxError;
use crate::value::CacheValue;

/// Type-erased producer re-invoked by refresh cycles.
pub(crate) type Producer<V> =
    Arc<dyn Fn() -> BoxFuture<'static, Result<V, BoxError>> + Send + Sync>;

/// Handle to one arming of the refresh loop, stored inside the entry it
/// keeps fresh.
#[derive(Debug)]
pub(crate) struct RefreshTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshTask {
    pub(crate) fn new(token: CancellationToken, handle: JoinHandle<()>) -> Self {
        Self { token, handle }
    }

    /// Cancel this arming. The token flip is observed under the storage
    /// lock, so an in-flight cycle can never store after cancellation.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
        self.handle.abort();
    }
}

/// Resolved timing for one arming of the refresh loop.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RefreshSchedule {
    pub(crate) interval: Duration,
    pub(crate) failure_interval: Option<Duration>,
    pub(crate) ttl: Option<Duration>,
}

impl RefreshSchedule {
    /// Extract a schedule from lookup options; a missing or zero interval
    /// means no refresh.
    pub(crate) fn from_options(options: &GetAndSetOptions) -> Option<Self> {
        let interval = options.refresh_interval.filter(|interval| !interval.is_zero())?;
        Some(Self {
            interval,
            failure_interval: options.refresh_failure_interval,
            ttl: options.ttl,
        })
    }
}

/// Body of one refresh task.
///
/// Holds only a weak handle to the cache so an abandoned instance's tasks
/// terminate instead of keeping its storage alive.
pub(crate) async fn run<V, C>(
    cache: WeakCache<V, C>,
    key: CacheKey,
    producer: Producer<V>,
    schedule: RefreshSchedule,
    token: CancellationToken,
) where
    V: CacheValue,
    C: Clock + Clone,
{
    let mut interval = schedule.interval;
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!(key = key.as_str(), "refresh task cancelled");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                let Some(cache) = cache.upgrade() else { break };
                match producer().await {
                    Ok(value) => {
                        if !cache.store_refreshed(&key, &value, &token, schedule.ttl) {
                            break;
                        }
                        interval = schedule.interval;
                    }
                    Err(error) => {
                        warn!(
                            id = cache.id(),
                            key = key.as_str(),
                            error = %error,
                            "background refresh failed; keeping cached value"
                        );
                        interval = schedule.failure_interval.unwrap_or(schedule.interval);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::refresh.
    use super::*;

    /// Validates `RefreshSchedule::from_options` behavior for the interval
    /// extraction scenario.
    ///
    /// Assertions:
    /// - Confirms no schedule without a refresh interval.
    /// - Confirms a zero interval is treated as "no refresh".
    /// - Confirms intervals and ttl carry over.
    #[test]
    fn test_schedule_from_options() {
        assert!(RefreshSchedule::from_options(&GetAndSetOptions::new()).is_none());
        assert!(RefreshSchedule::from_options(
            &GetAndSetOptions::new().refresh_interval(Duration::ZERO)
        )
        .is_none());

        let options = GetAndSetOptions::new()
            .ttl(Duration::from_secs(10))
            .refresh_interval(Duration::from_millis(250))
            .refresh_failure_interval(Duration::from_millis(125));
        let schedule = RefreshSchedule::from_options(&options);

        assert!(schedule.is_some());
        if let Some(schedule) = schedule {
            assert_eq!(schedule.interval, Duration::from_millis(250));
            assert_eq!(schedule.failure_interval, Some(Duration::from_millis(125)));
            assert_eq!(schedule.ttl, Some(Duration::from_secs(10)));
        }
    }
}
