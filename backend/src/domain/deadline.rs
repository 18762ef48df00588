//! Deadlines for calls that leave the process.
//!
//! Every record-store and mail-sender call runs under a [`Deadline`]. Dropping
//! the returned future (for example when the client disconnects and actix
//! cancels the handler) cancels the in-flight call as well.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Default bound applied to store and mailer calls.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

/// A call did not finish in time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} did not complete within {after:?}")]
pub struct DeadlineExceeded {
    /// Name of the bounded operation.
    pub operation: &'static str,
    /// Configured bound.
    pub after: Duration,
}

/// Upper bound on the duration of a single outbound call.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use social_backend::domain::{Deadline, DeadlineExceeded};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let deadline = Deadline::new(Duration::from_millis(50));
/// let result: Result<u8, DeadlineExceeded> =
///     deadline.bound("example", async { Ok(7) }).await;
/// assert_eq!(result, Ok(7));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Duration);

impl Default for Deadline {
    fn default() -> Self {
        Self(DEFAULT_DEADLINE)
    }
}

impl Deadline {
    /// Build a deadline of `after`.
    pub const fn new(after: Duration) -> Self {
        Self(after)
    }

    /// Configured bound.
    pub const fn duration(self) -> Duration {
        self.0
    }

    /// Await `fut`, failing with `E::from(DeadlineExceeded)` once the bound
    /// elapses.
    pub async fn bound<T, E, F>(self, operation: &'static str, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<DeadlineExceeded>,
    {
        match tokio::time::timeout(self.0, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, after_ms = self.0.as_millis(), "outbound call timed out");
                Err(E::from(DeadlineExceeded {
                    operation,
                    after: self.0,
                }))
            }
        }
    }
}
