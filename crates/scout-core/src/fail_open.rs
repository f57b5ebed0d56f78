//! Fail-open helper for side channels
//!
//! Some work should never end a run when it breaks: the activity log is the
//! main example. Wrap it in [`fail_open`] and a failure becomes a warning.
//!
//! DO NOT use fail-open for:
//! - Proposer calls
//! - URL validation
//! - The final export

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Execute an operation that should fail open
///
/// Logs the error via `tracing::warn!` on failure and returns `None`.
///
/// # Usage
///
/// ```no_run
/// use scout_core::fail_open::fail_open;
/// use scout_core::Result;
///
/// async fn log_round() -> Result<()> {
///     Ok(())
/// }
///
/// async fn example() {
///     let result = fail_open("activity_logger", || log_round()).await;
///     // result is None if log_round() failed, otherwise Some(())
/// }
/// ```
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}
