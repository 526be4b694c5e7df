//! Retry policy and transient-failure classification.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

/// Exponential backoff parameters. Stateless; applied per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Growth factor per attempt.
    pub multiplier: f64,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
    /// Scale each delay by a random factor in `[0.5, 1.0]`.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Attempts actually made; zero is treated as one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after the `failed_attempt`-th attempt (1-based) failed,
    /// before jitter.
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        let delay = self.base_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }

    /// Backoff with jitter applied when enabled.
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let delay = self.backoff(failed_attempt);
        if self.jitter {
            let scale: f64 = rand::thread_rng().gen_range(0.5..=1.0);
            delay.mul_f64(scale)
        } else {
            delay
        }
    }
}

/// Status codes retried by default: timeouts, throttling and gateway-class
/// server failures.
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Decides which failures are transient.
///
/// Transport failures (connection, DNS, timeout) are always transient; HTTP
/// statuses are transient only if listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryClassifier {
    retryable_statuses: Vec<u16>,
}

impl Default for RetryClassifier {
    fn default() -> Self {
        Self {
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }
}

impl RetryClassifier {
    /// Classifier that retries exactly the given statuses.
    pub fn with_statuses(statuses: impl IntoIterator<Item = u16>) -> Self {
        Self {
            retryable_statuses: statuses.into_iter().collect(),
        }
    }

    pub fn is_transient(&self, err: &NetworkError) -> bool {
        match err {
            NetworkError::ConnectionFailed { .. }
            | NetworkError::DnsResolutionFailed { .. }
            | NetworkError::Timeout { .. } => true,
            NetworkError::RateLimited { .. } => self.retryable_statuses.contains(&429),
            NetworkError::HttpStatus { status, .. } => self.retryable_statuses.contains(status),
            NetworkError::InvalidResponse { .. } | NetworkError::Other { .. } => false,
        }
    }
}
