//! Token-bucket rate limiting for outbound provider calls.
//!
//! A single bucket with floating-point tokens and continuous refill: every
//! consumption attempt first tops the bucket up by `elapsed * rate`, capped at
//! `capacity`.  [`RateLimiter::acquire`] blocks the calling task until enough
//! tokens are available, polling at an interval proportional to `1/rate`.
//! Waiters are not queued; whichever task's poll lands first wins.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    updated_at: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            updated_at: Instant::now(),
        }
    }

    fn consume(&mut self, amount: f64, rate: f64, capacity: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.updated_at).as_secs_f64();
        self.updated_at = now;

        self.tokens = (self.tokens + elapsed * rate).min(capacity);

        if self.tokens >= amount {
            self.tokens -= amount;
            true
        } else {
            false
        }
    }
}

/// Async token-bucket limiter shared by all provider adapters.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
    rate: f64,
    capacity: f64,
}

impl RateLimiter {
    /// `rate` tokens refill per second, up to `capacity`.
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(capacity)),
            rate,
            capacity,
        }
    }

    /// Take `tokens` from the bucket without waiting.
    pub async fn try_acquire(&self, tokens: f64) -> bool {
        let mut bucket = self.bucket.lock().await;
        bucket.consume(tokens, self.rate, self.capacity)
    }

    /// Block the calling task until `tokens` are available.
    ///
    /// Polls roughly every `1/rate` seconds with a 10ms floor so a high rate
    /// does not busy-spin the executor.
    pub async fn acquire(&self, tokens: f64) {
        let interval = Duration::from_secs_f64((1.0 / self.rate).max(0.01));
        loop {
            if self.try_acquire(tokens).await {
                return;
            }
            tokio::time::sleep(interval).await;
        }
    }
}
