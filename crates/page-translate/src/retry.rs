//! Bounded retry with exponential backoff.
//!
//! Sleeping goes through the [`Sleeper`] trait so tests can observe the
//! backoff schedule without waiting.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::error::Retryable;

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Total number of calls, including the first one.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff_ms: 500,
            max_backoff_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `retry` (1 for the first retry).
    ///
    /// # Example
    ///
    /// ```
    /// use page_translate::retry::RetryConfig;
    /// use std::time::Duration;
    ///
    /// let config = RetryConfig::default();
    /// assert_eq!(config.delay_for(1), Duration::from_millis(500));
    /// assert_eq!(config.delay_for(2), Duration::from_millis(1000));
    /// assert_eq!(config.delay_for(10), Duration::from_millis(10_000));
    /// ```
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(63) as i32;
        let ms = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = ms.min(self.max_backoff_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

/// Outcome of a retried operation that did not succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
    #[error("not retryable: {0}")]
    Permanent(E),
}

impl<E> RetryError<E> {
    /// The last error seen.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Permanent(err) => err,
        }
    }

    pub fn inner(&self) -> &E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Permanent(err) => err,
        }
    }
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested sleeps instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(duration);
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or the attempt
/// budget is spent.
///
/// Only errors whose [`Retryable::is_retryable`] returns true are retried.
///
/// # Example
///
/// ```
/// use page_translate::error::TransferError;
/// use page_translate::retry::{execute_with_backoff, RecordingSleeper, RetryConfig};
///
/// let sleeper = RecordingSleeper::new();
/// let mut calls = 0;
/// let result = execute_with_backoff(&RetryConfig::default(), &sleeper, "fetch", || {
///     calls += 1;
///     if calls < 3 {
///         Err(TransferError::Transient("503".into()))
///     } else {
///         Ok(calls)
///     }
/// });
/// assert_eq!(result, Ok(3));
/// assert_eq!(sleeper.slept().len(), 2);
/// ```
pub fn execute_with_backoff<T, E, F>(
    config: &RetryConfig,
    sleeper: &dyn Sleeper,
    what: &str,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: Retryable + fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(RetryError::Permanent(err)),
            Err(err) if attempt >= max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                })
            }
            Err(err) => {
                let delay = config.delay_for(attempt);
                warn!(
                    what,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying"
                );
                sleeper.sleep(delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferError;

    #[test]
    fn test_permanent_error_is_not_retried() {
        let sleeper = RecordingSleeper::new();
        let mut calls = 0;
        let result: Result<(), _> =
            execute_with_backoff(&RetryConfig::default(), &sleeper, "fetch", || {
                calls += 1;
                Err(TransferError::Auth("401".into()))
            });
        assert_eq!(
            result,
            Err(RetryError::Permanent(TransferError::Auth("401".into())))
        );
        assert_eq!(calls, 1);
        assert!(sleeper.slept().is_empty());
    }

    #[test]
    fn test_exhaustion_reports_attempts_and_backoff_schedule() {
        let sleeper = RecordingSleeper::new();
        let config = RetryConfig {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 150,
            backoff_multiplier: 2.0,
        };
        let result: Result<(), _> = execute_with_backoff(&config, &sleeper, "update", || {
            Err(TransferError::Transient("502".into()))
        });
        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: 3,
                last: TransferError::Transient("502".into())
            })
        );
        assert_eq!(
            sleeper.slept(),
            vec![Duration::from_millis(100), Duration::from_millis(150)]
        );
    }

    #[test]
    fn test_zero_attempts_still_calls_once() {
        let sleeper = RecordingSleeper::new();
        let config = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        let mut calls = 0;
        let _: Result<(), _> = execute_with_backoff(&config, &sleeper, "fetch", || {
            calls += 1;
            Err(TransferError::Transient("x".into()))
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_into_inner() {
        let err = RetryError::Exhausted {
            attempts: 2,
            last: TransferError::Transient("x".into()),
        };
        assert_eq!(err.into_inner(), TransferError::Transient("x".into()));
    }
}
