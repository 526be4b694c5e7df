//! Error category classification.
//!
//! Every error surfaced in the status bar is mapped to a category so the
//! dashboard can pick a label and a hint without matching on concrete types.

use std::fmt;

/// High-level categorization of errors for display and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection, DNS or timeout problems. Transient.
    Network,

    /// The remote API answered with a server-side failure (5xx, throttling). Transient.
    Server,

    /// Credentials were rejected (401/403).
    Auth,

    /// The request itself was wrong or the response could not be decoded.
    Client,

    /// A contract violation inside the process (duplicate registration, unknown module).
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Short label used in logs and the status bar.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Server => "server",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Client => "client",
            ErrorCategory::Configuration => "configuration",
        }
    }

    /// One-line hint displayed next to the error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "check connectivity, then press r to retry",
            ErrorCategory::Server => "the API is struggling, press r to retry later",
            ErrorCategory::Auth => "check credentials for this project",
            ErrorCategory::Client => "the request was rejected by the API",
            ErrorCategory::Configuration => "check the module registration",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
