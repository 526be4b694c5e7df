//! Trait abstractions for dependency injection and testability.
//!
//! - [`HttpClient`] - outbound HTTP used by resource modules

pub mod http;

pub use http::{Headers, HttpClient, Response};
