//! Errors raised by modules and the module registry.

use thiserror::Error;

use super::category::ErrorCategory;
use super::network::NetworkError;

/// Failure reported by a module, either while setting up its client or while
/// fetching data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModuleError {
    /// The module's client could not be set up for the given project.
    #[error("initialization failed for '{module}': {message}")]
    Init { module: String, message: String },

    /// A remote call failed after the gateway gave up on it.
    #[error(transparent)]
    Fetch(#[from] NetworkError),

    /// The remote answered but the payload did not have the expected shape.
    #[error("could not decode {what}: {message}")]
    Decode { what: String, message: String },
}

impl ModuleError {
    pub fn init(module: impl Into<String>, message: impl Into<String>) -> Self {
        ModuleError::Init {
            module: module.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ModuleError::Init { .. } => ErrorCategory::Auth,
            ModuleError::Fetch(err) => err.category(),
            ModuleError::Decode { .. } => ErrorCategory::Client,
        }
    }
}

/// Failures of the module registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A second factory was registered under an existing key.
    #[error("module '{0}' is already registered")]
    DuplicateKey(String),

    /// No factory is registered under the key.
    #[error("no module registered as '{0}'")]
    UnknownKey(String),

    /// The factory itself failed; no instance was kept.
    #[error("could not construct module '{key}': {source}")]
    Construction {
        key: String,
        #[source]
        source: ModuleError,
    },

    /// The instance was constructed but `initialize` failed; it stays cached in
    /// its error state.
    #[error("module '{key}' failed to initialize: {source}")]
    Initialization {
        key: String,
        #[source]
        source: ModuleError,
    },
}

impl RegistryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RegistryError::DuplicateKey(_) | RegistryError::UnknownKey(_) => {
                ErrorCategory::Configuration
            }
            RegistryError::Construction { source, .. }
            | RegistryError::Initialization { source, .. } => source.category(),
        }
    }
}
