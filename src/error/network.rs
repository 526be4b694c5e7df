//! Transport-level errors for outbound API calls.
//!
//! Every call that goes through the [`Gateway`](crate::gateway::Gateway)
//! resolves to `Result<T, NetworkError>`. Whether a variant is transient is
//! decided by a [`RetryClassifier`](crate::gateway::RetryClassifier); the
//! default classifier is exposed here as [`NetworkError::is_retryable`].

use std::fmt;

use super::category::ErrorCategory;
use crate::gateway::RetryClassifier;

/// Network-specific error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Connection to the API failed.
    ConnectionFailed { url: String, message: String },

    /// Host name could not be resolved.
    DnsResolutionFailed { host: String },

    /// A single attempt exceeded the gateway's per-call timeout.
    Timeout { operation: String, duration_ms: u64 },

    /// Non-2xx response.
    HttpStatus { status: u16, message: String },

    /// The API throttled us (429 with an optional `Retry-After`).
    RateLimited { retry_after_secs: Option<u64> },

    /// Response body could not be decoded.
    InvalidResponse { message: String },

    /// Anything else the transport reported.
    Other { message: String },
}

impl NetworkError {
    /// Check the error against the default transient-failure classifier.
    pub fn is_retryable(&self) -> bool {
        RetryClassifier::default().is_transient(self)
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::HttpStatus { status, .. } => Some(*status),
            NetworkError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Map the error onto a display category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            NetworkError::ConnectionFailed { .. }
            | NetworkError::DnsResolutionFailed { .. }
            | NetworkError::Timeout { .. } => ErrorCategory::Network,
            NetworkError::RateLimited { .. } => ErrorCategory::Server,
            NetworkError::HttpStatus { status, .. } => match *status {
                401 | 403 => ErrorCategory::Auth,
                500..=599 | 408 | 429 => ErrorCategory::Server,
                _ => ErrorCategory::Client,
            },
            NetworkError::InvalidResponse { .. } => ErrorCategory::Client,
            NetworkError::Other { .. } => ErrorCategory::Network,
        }
    }

    /// Short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed { .. } => "E_NET_CONN",
            NetworkError::DnsResolutionFailed { .. } => "E_NET_DNS",
            NetworkError::Timeout { .. } => "E_NET_TIMEOUT",
            NetworkError::HttpStatus { .. } => "E_NET_HTTP",
            NetworkError::RateLimited { .. } => "E_NET_RATE",
            NetworkError::InvalidResponse { .. } => "E_NET_INVALID",
            NetworkError::Other { .. } => "E_NET_OTHER",
        }
    }

    /// Build an error from a non-success HTTP status.
    ///
    /// 429 becomes [`NetworkError::RateLimited`] so the gateway can honor a
    /// server-provided delay.
    pub fn from_status(status: u16, message: impl Into<String>, retry_after_secs: Option<u64>) -> Self {
        if status == 429 {
            NetworkError::RateLimited { retry_after_secs }
        } else {
            NetworkError::HttpStatus {
                status,
                message: message.into(),
            }
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::ConnectionFailed { url, message } => {
                write!(f, "connection to '{}' failed: {}", url, message)
            }
            NetworkError::DnsResolutionFailed { host } => {
                write!(f, "could not resolve '{}'", host)
            }
            NetworkError::Timeout { operation, duration_ms } => {
                write!(f, "{} timed out after {}ms", operation, duration_ms)
            }
            NetworkError::HttpStatus { status, message } => {
                write!(f, "HTTP {}: {}", status, message)
            }
            NetworkError::RateLimited { retry_after_secs } => match retry_after_secs {
                Some(secs) => write!(f, "rate limited, retry after {}s", secs),
                None => write!(f, "rate limited"),
            },
            NetworkError::InvalidResponse { message } => {
                write!(f, "invalid response: {}", message)
            }
            NetworkError::Other { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Classify a reqwest error into a NetworkError.
pub fn classify_reqwest_error(err: &reqwest::Error, url: &str) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout {
            operation: format!("request to {}", url),
            duration_ms: 0,
        }
    } else if err.is_connect() {
        let text = err.to_string().to_lowercase();
        if text.contains("dns") || text.contains("resolve") {
            NetworkError::DnsResolutionFailed {
                host: extract_host_from_url(url),
            }
        } else {
            NetworkError::ConnectionFailed {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    } else if let Some(status) = err.status() {
        NetworkError::from_status(status.as_u16(), err.to_string(), None)
    } else if err.is_decode() {
        NetworkError::InvalidResponse {
            message: err.to_string(),
        }
    } else {
        NetworkError::Other {
            message: err.to_string(),
        }
    }
}

fn extract_host_from_url(url: &str) -> String {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    without_scheme
        .split(['/', ':'])
        .next()
        .unwrap_or(url)
        .to_string()
}
