//! Token-bucket admission control.
//!
//! One bucket is shared by every outbound attempt in the process. Callers
//! that find the bucket empty queue on the bucket's lock in arrival order and
//! sleep until the next token is due; work is never dropped.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Bucket sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum burst size.
    pub capacity: u32,
    /// Tokens added per second.
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            refill_per_sec: 10.0,
        }
    }
}

/// Slowest refill we accept; keeps the wait computation finite.
const MIN_REFILL_PER_SEC: f64 = 0.001;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a full bucket.
    pub fn new(config: RateLimitConfig) -> Self {
        let capacity = f64::from(config.capacity.max(1));
        Self {
            capacity,
            refill_per_sec: config.refill_per_sec.max(MIN_REFILL_PER_SEC),
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
    }

    /// Take a token, waiting for one to be replenished if the bucket is empty.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        if state.tokens < 1.0 {
            let deficit = 1.0 - state.tokens;
            let wait = Duration::from_secs_f64(deficit / self.refill_per_sec);
            tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limiter saturated");
            tokio::time::sleep(wait).await;
            self.refill(&mut state);
        }
        state.tokens = (state.tokens - 1.0).max(0.0);
    }

    /// Take a token only if one is available right now.
    ///
    /// Returns false when the bucket is empty or another caller is queued.
    pub fn try_acquire(&self) -> bool {
        let Ok(mut state) = self.state.try_lock() else {
            return false;
        };
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens currently available (after refill), rounded down.
    pub fn available(&self) -> u32 {
        match self.state.try_lock() {
            Ok(mut state) => {
                self.refill(&mut state);
                state.tokens.floor() as u32
            }
            Err(_) => 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }
}
