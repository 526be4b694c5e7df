//! Test doubles for the trait abstractions.
//!
//! - [`MockHttpClient`] - HTTP client with queued per-URL responses

pub mod http;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
