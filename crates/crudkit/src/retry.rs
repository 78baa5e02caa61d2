//! Bounded retry with a fixed pause between attempts.

use crudkit_core::Result;
use std::time::Duration;
use tracing::warn;

/// Pause policy between two attempts of the same statement.
pub trait Backoff: Send + Sync {
    /// How long to wait after the given failed attempt (1-based).
    fn delay(&self, attempt: u32) -> Duration;

    /// Block the current thread before the next attempt.
    fn wait(&self, attempt: u32) {
        let delay = self.delay(attempt);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// The same delay after every attempt. No growth, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Backoff for FixedBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

/// Run `operation` up to `attempts` times (at least once).
///
/// The closure receives the 1-based attempt number. Between failed attempts
/// a warning is traced and `backoff` is waited on; there is no wait after
/// the last attempt. On exhaustion the last error is returned unchanged.
#[allow(clippy::result_large_err)]
pub fn retry<T, F>(
    operation_name: &str,
    attempts: u32,
    backoff: &dyn Backoff,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Result<T>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(
                    target: "crudkit::retry",
                    operation = operation_name,
                    attempt,
                    attempts,
                    delay_ms = u64::try_from(backoff.delay(attempt).as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "Statement failed, retrying"
                );
                backoff.wait(attempt);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
