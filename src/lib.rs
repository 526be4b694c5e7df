//! cloudeck - a terminal dashboard over many remote resource types.
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod aggregator;
pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod module;
pub mod modules;
pub mod registry;
pub mod terminal;
#[doc(hidden)]
pub mod testing;
pub mod traits;
pub mod ui;
