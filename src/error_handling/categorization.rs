//! Error retriability and retry strategy.
//!
//! This module decides which fetch failures are transient and configures the
//! exponential backoff used between attempts.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use super::types::FetchError;
use crate::config::HTTP_STATUS_TOO_MANY_REQUESTS;

/// Retry settings shared by CDX queries and snapshot fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, initial attempt included
    pub max_attempts: usize,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
        }
    }

    /// Creates the backoff delays between attempts.
    ///
    /// Delay `n` (0-based) is `initial_delay * 2^n`, capped at `max_delay`.
    /// The iterator yields `max_attempts - 1` delays, so the total number of
    /// attempts made by `RetryIf` is `max_attempts`.
    pub fn strategy(&self) -> impl Iterator<Item = Duration> {
        // ExponentialBackoff yields factor * base^(n+1); base 2 with factor
        // initial/2 gives initial * 2^n.
        let half_initial_ms = (self.initial_delay.as_millis() as u64 / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(half_initial_ms)
            .max_delay(self.max_delay)
            .take(self.max_attempts.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::config::RETRY_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(crate::config::RETRY_INITIAL_DELAY_MS),
            max_delay: Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS),
        }
    }
}

/// Determines if a fetch error is retriable.
///
/// # Retriable Errors
///
/// - Timeouts and connection failures
/// - Rate limiting (429 Too Many Requests)
/// - Server errors (5xx)
/// - Transport errors raised while sending the request or reading the body
///
/// # Non-Retriable Errors
///
/// - Client errors (4xx except 429); the archive answers 404 for captures it
///   cannot replay and repeating the request will not change that
/// - Oversized bodies and invalid URLs
pub fn is_retriable(error: &FetchError) -> bool {
    match error {
        FetchError::Timeout { .. } | FetchError::Connect { .. } => true,
        FetchError::Status { status, .. } => {
            *status == HTTP_STATUS_TOO_MANY_REQUESTS || (500..600).contains(status)
        }
        FetchError::Transport { source, .. } => {
            source.is_request() || source.is_body() || source.is_timeout()
        }
        FetchError::BodyTooLarge { .. } | FetchError::InvalidUrl(_) => false,
    }
}
