//! Rate limiter initialization.
//!
//! This module provides the token-bucket rate limiter shared by every request
//! sent to the archive.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Token-bucket rate limiter for controlling request rate.
///
/// # Behavior
///
/// - The bucket starts full, so a burst of up to `capacity` requests passes
///   immediately after an idle period
/// - Tokens refill continuously from elapsed time, not from a timer tick
/// - Waiters are served in FIFO order: the bucket lives behind a fair
///   `tokio::sync::Mutex` and a waiter sleeps while holding it
/// - One instance is shared through `Arc` by the CDX client and the page
///   parser, so the ceiling is global across concurrent recoveries
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    rate: Option<f64>,
    capacity: f64,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, rate: f64, capacity: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + rate * elapsed.as_secs_f64()).min(capacity);
        self.last_refill = now;
    }
}

impl RateLimiter {
    /// Creates a limiter refilling `rps` tokens per second into a bucket of `burst` tokens.
    ///
    /// An `rps` of 0 disables limiting.
    pub fn new(rps: u32, burst: u32) -> Self {
        let capacity = f64::from(burst.max(1));
        RateLimiter {
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            rate: (rps > 0).then_some(f64::from(rps)),
            capacity,
        }
    }

    /// Creates a limiter that never waits.
    pub fn unlimited() -> Self {
        Self::new(0, 1)
    }

    /// Waits until a token is available, then consumes it.
    pub async fn acquire(&self) {
        let Some(rate) = self.rate else {
            return;
        };

        let mut bucket = self.bucket.lock().await;
        bucket.refill(rate, self.capacity, Instant::now());

        if bucket.tokens < 1.0 {
            let deficit = 1.0 - bucket.tokens;
            tokio::time::sleep(Duration::from_secs_f64(deficit / rate)).await;
            bucket.refill(rate, self.capacity, Instant::now());
        }

        // Float drift can leave the refilled bucket a hair under one token.
        bucket.tokens = (bucket.tokens - 1.0).max(0.0);
    }

    /// Configured refill rate, 0 when limiting is disabled.
    pub fn rps(&self) -> u32 {
        self.rate.map(|rate| rate as u32).unwrap_or(0)
    }

    /// Tokens currently in the bucket (after refilling up to now).
    pub async fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        if let Some(rate) = self.rate {
            bucket.refill(rate, self.capacity, Instant::now());
        }
        bucket.tokens
    }
}

/// Initializes the shared token-bucket rate limiter.
///
/// # Arguments
///
/// * `rps` - Requests per second (0 disables rate limiting)
/// * `burst` - Burst capacity (maximum tokens in bucket)
pub fn init_rate_limiter(rps: u32, burst: u32) -> Arc<RateLimiter> {
    if rps == 0 {
        log::warn!("Rate limiting disabled (rps = 0); archive requests are unthrottled");
    }
    Arc::new(RateLimiter::new(rps, burst))
}
