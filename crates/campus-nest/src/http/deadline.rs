use std::time::Duration;

use tracing::warn;

use crate::error::ServiceError;

/// Runs blocking store work on the blocking pool and bounds it by `budget`.
///
/// A request that overruns its budget gets `DeadlineExceeded`; the worker keeps running to
/// completion and its result is dropped.
pub async fn run_blocking<T, F>(budget: Duration, work: F) -> Result<T, ServiceError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
{
    match tokio::time::timeout(budget, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => Err(ServiceError::Worker(err.to_string())),
        Err(_) => {
            warn!(budget_secs = budget.as_secs(), "request deadline exceeded");
            Err(ServiceError::DeadlineExceeded(budget))
        }
    }
}
