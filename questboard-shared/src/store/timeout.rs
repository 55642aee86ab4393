/// Timeouts for document store calls
///
/// Every call to the remote store is bounded so an unresponsive network can
/// never block a user action indefinitely. A call that runs past its timeout
/// is abandoned and reported as `StoreError::Timeout`, which callers treat as
/// a persistence failure.
///
/// # Limits
///
/// - No timeout configured: 10 seconds
/// - Minimum timeout: 100 milliseconds
/// - Maximum timeout: 60 seconds
///
/// # Example
///
/// ```no_run
/// use questboard_shared::store::StoreTimeout;
/// use std::time::Duration;
///
/// # async fn example() {
/// let timeout = StoreTimeout::from_millis(Some(2_000));
/// let result = timeout.run(async { 42 }).await;
/// assert_eq!(result.unwrap(), 42);
/// # }
/// ```

use super::{StoreError, StoreResult};
use std::future::Future;
use std::time::Duration;

/// Default store call timeout (10 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum allowed timeout (100 milliseconds)
pub const MIN_TIMEOUT: Duration = Duration::from_millis(100);

/// Maximum allowed timeout (60 seconds)
pub const MAX_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout applied to each store call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreTimeout {
    duration: Duration,
}

impl StoreTimeout {
    /// Creates a timeout, clamped to the allowed range
    pub fn new(duration: Duration) -> Self {
        StoreTimeout {
            duration: duration.clamp(MIN_TIMEOUT, MAX_TIMEOUT),
        }
    }

    /// Creates a timeout from an optional millisecond setting
    ///
    /// `None` selects the default; zero is treated as the minimum.
    pub fn from_millis(millis: Option<u64>) -> Self {
        match millis {
            Some(ms) => StoreTimeout::new(Duration::from_millis(ms)),
            None => StoreTimeout::default(),
        }
    }

    /// Gets the timeout duration
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Runs `call`, failing with `StoreError::Timeout` if it takes too long
    pub async fn run<F, T>(&self, call: F) -> StoreResult<T>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.duration, call)
            .await
            .map_err(|_| StoreError::Timeout(self.duration))
    }
}

impl Default for StoreTimeout {
    fn default() -> Self {
        StoreTimeout {
            duration: DEFAULT_TIMEOUT,
        }
    }
}
