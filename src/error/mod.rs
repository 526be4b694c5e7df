//! Error taxonomy for the dashboard.
//!
//! - **Initialization errors**: a module's client setup fails
//!   ([`ModuleError::Init`]); the module is left in its error state and
//!   other modules are unaffected.
//! - **Transient remote errors**: [`NetworkError`] variants the gateway
//!   retries.
//! - **Terminal fetch errors**: whatever the gateway returns after giving up,
//!   surfaced to the module as [`ModuleError::Fetch`].
//! - **Contract violations**: [`RegistryError::DuplicateKey`] at startup.
//! - **Partial aggregation failures**: per-label entries in an
//!   [`Aggregate`](crate::aggregator::Aggregate), never escalated.
//!
//! | Category | Retryable |
//! |----------|-----------|
//! | Network | Yes |
//! | Server | Yes |
//! | Auth | No |
//! | Client | No |
//! | Configuration | No |

mod category;
mod module;
mod network;

pub use category::ErrorCategory;
pub use module::{ModuleError, RegistryError};
pub use network::{classify_reqwest_error, NetworkError};
