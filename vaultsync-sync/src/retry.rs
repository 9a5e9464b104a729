//! Backoff for transient store failures.

use crate::config::RetryConfig;
use crate::error::{SyncError, SyncResult};
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

fn backoff(config: &RetryConfig) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(config.initial_backoff_ms))
        .with_max_delay(Duration::from_millis(config.max_backoff_ms))
        .with_factor(config.factor)
        .with_max_times(config.max_attempts.saturating_sub(1))
}

/// Runs `operation`, retrying [`SyncError::is_retryable`] failures with
/// exponential backoff. Anything else is returned on first occurrence.
pub(crate) async fn with_backoff<T, F, Fut>(
    config: &RetryConfig,
    what: &'static str,
    operation: F,
) -> SyncResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SyncResult<T>>,
{
    operation
        .retry(backoff(config))
        .sleep(tokio::time::sleep)
        .when(SyncError::is_retryable)
        .notify(|err: &SyncError, delay: Duration| {
            warn!("{} failed, retrying in {:?}: {}", what, delay, err);
        })
        .await
}
