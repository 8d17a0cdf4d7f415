//! Optimistic-concurrency retry loop.
//!
//! Ledger writes read a balance row and update it conditionally on the
//! version they read. When another writer got there first the whole
//! transaction body is re-run against fresh data.

use std::future::Future;

use tracing::warn;

use super::ledger::LedgerError;

/// Runs `op` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` conflicting attempts have been made.
///
/// `op` receives the 1-based attempt number and must only touch the
/// database, since it can run more than once.
pub async fn retry_on_conflict<T, F, Fut>(max_attempts: u32, mut op: F) -> Result<T, LedgerError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let max_attempts = max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match op(attempt).await {
            Err(err) if err.is_retryable() => {
                warn!(attempt, max_attempts, error = %err, "Write conflict, retrying");
            }
            other => return other,
        }
    }
    Err(LedgerError::RetriesExhausted {
        attempts: max_attempts,
    })
}
