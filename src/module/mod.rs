//! The contract every pluggable module implements.
//!
//! A module owns the rendering and input handling for one resource type. It
//! runs on the event-loop thread: every method is synchronous and returns
//! immediately. Remote work is requested through [`Commands`] and its result
//! comes back later via [`Module::handle_message`].
//!
//! - [`Module`] - the trait
//! - [`ModuleContext`] - shared services handed to factories and `initialize`
//! - [`Lifecycle`] / [`ModuleState`] - the per-module state machine
//! - [`Commands`] / [`UiMessage`] / [`ModuleMessage`] - effects and results

mod command;
mod lifecycle;

pub use command::{Command, Commands, ModuleMessage, UiMessage, Work};
pub use lifecycle::{Lifecycle, ModuleState};

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyEvent;

use crate::cache::TtlCache;
use crate::config::AppConfig;
use crate::error::ModuleError;
use crate::gateway::Gateway;
use crate::traits::HttpClient;

/// Shared services and the current parameter (project) for module setup.
///
/// Cloning is cheap; every service is behind an `Arc`.
#[derive(Clone)]
pub struct ModuleContext {
    pub project: String,
    pub cache: Arc<TtlCache>,
    pub gateway: Arc<Gateway>,
    pub http: Arc<dyn HttpClient>,
    pub config: Arc<AppConfig>,
}

impl ModuleContext {
    pub fn new(
        config: Arc<AppConfig>,
        cache: Arc<TtlCache>,
        gateway: Arc<Gateway>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            project: config.project.clone(),
            cache,
            gateway,
            http,
            config,
        }
    }

    /// Same services, different project.
    pub fn with_project(&self, project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContext")
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}

/// A pluggable dashboard module.
pub trait Module: Send {
    /// Registry key.
    fn key(&self) -> &str;

    /// Sidebar title.
    fn title(&self) -> &str;

    fn state(&self) -> ModuleState;

    /// Set up the module's client for `ctx.project`. On failure the module
    /// must be in [`ModuleState::Error`].
    fn initialize(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError>;

    /// Tear down the previous client and initialize against `ctx.project`.
    /// A call with the project the module is already on is a no-op.
    fn reinitialize(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError>;

    /// Input routed to the module while it has focus.
    fn handle_key(&mut self, key: KeyEvent) -> Commands;

    /// Result of work previously requested through [`Commands::spawn`].
    fn handle_message(&mut self, msg: ModuleMessage) -> Commands;

    /// Start a fetch of the module's data.
    fn refresh(&mut self) -> Commands;

    /// Return to Ready, dropping selection and error state.
    fn reset(&mut self);

    /// Background polling tick.
    fn tick(&mut self) -> Commands {
        Commands::none()
    }

    /// Window size notice.
    fn resize(&mut self, _width: u16, _height: u16) {}

    fn focus(&mut self) {}

    fn blur(&mut self) {}

    /// When true, a "back" input leaves the module instead of being handled
    /// by it.
    fn is_at_root(&self) -> bool;

    /// Display text for the content pane.
    fn render(&self) -> String;

    /// One-line key help for the status bar.
    fn help_text(&self) -> String;

    /// Interval for background polling while the module is active.
    fn poll_interval(&self) -> Option<Duration> {
        None
    }
}
