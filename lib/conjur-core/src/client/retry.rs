use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::warn;

use super::ConjurError;

/// Backoff used by [`retry_transport`] when none is given: 3 attempts after
/// the first one, from 100ms up to 2s, with jitter.
pub fn default_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(2))
        .with_max_times(3)
        .with_jitter()
}

/// Runs `operation` again while it fails with a transport error.
///
/// Calls are never retried implicitly by the clients: HTTP failures such as
/// `Conflict` or `ServerError` are returned after the first attempt, and a
/// transport failure is only retried when the caller opts in here.
///
/// # Example
///
/// ```rust,no_run
/// use conjur_core::client::{default_backoff, retry_transport};
/// use conjur_core::ResourceClient;
///
/// # async fn example(secrets: ResourceClient) -> Result<(), conjur_core::ConjurError> {
/// let value = retry_transport(&default_backoff(), || secrets.retrieve_secret("db/password")).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns the last error once the backoff is exhausted, or the first
/// error that is not retryable.
pub async fn retry_transport<T, F, Fut>(
    backoff: &ExponentialBuilder,
    operation: F,
) -> Result<T, ConjurError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ConjurError>>,
{
    operation
        .retry(backoff)
        .when(ConjurError::is_retryable)
        .notify(|error, delay| warn!(%error, ?delay, "transport failure, retrying"))
        .await
}
