//! Shared helper functions
//!
//! Common utilities used across the triage and action services.

use chrono::{DateTime, Duration, Utc};
use std::future::Future;

use crate::error::{AdapterError, Result, TriageError};

/// Run a mailbox call under a deadline. Expiry becomes [`AdapterError::Timeout`].
pub async fn with_timeout<T, F>(limit: std::time::Duration, call: F) -> std::result::Result<T, AdapterError>
where
    F: Future<Output = std::result::Result<T, AdapterError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Timeout(limit)),
    }
}

/// Run synchronous store work on the blocking pool, inside the caller's span.
///
/// SQLite may wait on `busy_timeout` under writer contention; that wait must
/// not hold a runtime worker.
pub async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        work()
    })
    .await
    .map_err(|e| TriageError::Io(format!("Store task failed: {}", e)))?
}

/// Reject blank ids before they reach the store or the mailbox.
pub fn validate_thread_id(id: &str) -> Result<&str> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(TriageError::InvalidInput(
            "thread id must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Hours from user input, without chrono's overflow panic.
pub fn hours_to_duration(hours: i64) -> Result<Duration> {
    Duration::try_hours(hours)
        .ok_or_else(|| TriageError::InvalidInput(format!("{} hours is out of range", hours)))
}

pub fn shift_forward(from: DateTime<Utc>, by: Duration) -> Result<DateTime<Utc>> {
    from.checked_add_signed(by).ok_or_else(|| {
        TriageError::InvalidInput(format!("{} from {} is out of range", by, from))
    })
}

pub fn shift_back(from: DateTime<Utc>, by: Duration) -> Result<DateTime<Utc>> {
    from.checked_sub_signed(by).ok_or_else(|| {
        TriageError::InvalidInput(format!("{} before {} is out of range", by, from))
    })
}
