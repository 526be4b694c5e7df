//! Application state and the orchestration loop's logic.
//!
//! [`App`] is the single writer of focus state and the only caller into the
//! active module. It runs on the event-loop task and never awaits; work is
//! spawned and its results come back as [`AppMessage`]s.
//!
//! - [`types`] - focus and view types
//! - [`AppMessage`] - messages from spawned work and timers
//! - [`CommandPalette`] - palette overlay
//! - navigation / handlers - transitions and input routing

mod handlers;
mod messages;
mod navigation;
mod palette;
mod timers;
mod types;

pub use messages::AppMessage;
pub use palette::{CommandPalette, PaletteAction, PaletteEntry};
pub use timers::PollTimer;
pub use types::{FocusArea, FocusState, HomeOverview, Toast, ViewMode};

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cache::TtlCache;
use crate::config::AppConfig;
use crate::gateway::Gateway;
use crate::module::{Command, Commands, Module, UiMessage};
use crate::registry::Registry;
use crate::traits::HttpClient;

/// Ticks a toast stays visible (the loop ticks every 250ms).
pub const TOAST_TICKS: u64 = 12;

pub struct App {
    pub registry: Registry,
    /// Services and the current project handed to modules.
    pub ctx: crate::module::ModuleContext,
    pub focus: FocusState,
    pub palette: CommandPalette,
    /// Highlighted sidebar row.
    pub sidebar_index: usize,
    /// Bumped whenever the active module or project changes. Results tagged
    /// with an older value are dropped on arrival.
    pub generation: u64,
    pub home: HomeOverview,
    pub toast: Option<Toast>,
    /// Last error surfaced to the status bar.
    pub last_error: Option<String>,
    pub message_tx: mpsc::UnboundedSender<AppMessage>,
    /// Taken by the event loop.
    pub message_rx: Option<mpsc::UnboundedReceiver<AppMessage>>,
    poll_timer: Option<PollTimer>,
    pub should_quit: bool,
    pub needs_redraw: bool,
    pub tick_count: u64,
    pub terminal_size: (u16, u16),
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("focus", &self.focus)
            .field("project", &self.ctx.project)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Build the shared services from `config` and wire them into a new app.
    pub fn new(config: AppConfig, registry: Registry, http: Arc<dyn HttpClient>) -> Self {
        let gateway = Gateway::new(config.rate_limit, config.retry.clone())
            .with_timeout(config.request_timeout);
        let ctx = crate::module::ModuleContext::new(
            Arc::new(config),
            Arc::new(TtlCache::new()),
            Arc::new(gateway),
            http,
        );
        Self::with_context(registry, ctx)
    }

    /// App over an existing context; tests use this to share services.
    pub fn with_context(registry: Registry, ctx: crate::module::ModuleContext) -> Self {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        Self {
            registry,
            ctx,
            focus: FocusState::default(),
            palette: CommandPalette::new(),
            sidebar_index: 0,
            generation: 0,
            home: HomeOverview::default(),
            toast: None,
            last_error: None,
            message_tx,
            message_rx: Some(message_rx),
            poll_timer: None,
            should_quit: false,
            needs_redraw: true,
            tick_count: 0,
            terminal_size: (0, 0),
        }
    }

    pub fn project(&self) -> &str {
        &self.ctx.project
    }

    pub fn config(&self) -> &AppConfig {
        &self.ctx.config
    }

    pub fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    pub fn quit(&mut self) {
        self.poll_timer = None;
        self.should_quit = true;
    }

    /// The module shown in the content pane, if any.
    pub fn active_module(&self) -> Option<&dyn Module> {
        match self.focus.view {
            ViewMode::ServiceDetail => self
                .focus
                .active_module
                .as_deref()
                .and_then(|key| self.registry.get(key)),
            ViewMode::Home => None,
        }
    }

    /// Key of the module a polling timer is running for.
    pub fn polling_module(&self) -> Option<&str> {
        self.poll_timer.as_ref().map(PollTimer::module)
    }

    /// Periodic tick from the event loop.
    pub fn tick(&mut self) {
        self.tick_count += 1;
        if let Some(toast) = &self.toast {
            if self.tick_count >= toast.expires_at_tick {
                self.toast = None;
                self.mark_dirty();
            }
        }
    }

    pub fn show_toast(&mut self, text: impl Into<String>) {
        self.toast = Some(Toast {
            text: text.into(),
            expires_at_tick: self.tick_count + TOAST_TICKS,
        });
        self.mark_dirty();
    }

    /// Surface an error in the status bar and as a toast.
    pub(crate) fn surface_error(&mut self, message: String) {
        tracing::warn!(error = %message, "surfacing error");
        self.show_toast(message.clone());
        self.last_error = Some(message);
    }

    /// Process one message from spawned work or a timer.
    pub fn handle_message(&mut self, msg: AppMessage) {
        if msg.generation() != self.generation {
            tracing::debug!(
                stale = msg.generation(),
                current = self.generation,
                "dropping stale message"
            );
            return;
        }

        match msg {
            AppMessage::ModuleResult {
                module, message, ..
            } => {
                if !self.focus.is_active(&module) {
                    tracing::debug!(module = %module, "dropping result for inactive module");
                    return;
                }
                let commands = match self.registry.get_mut(&module) {
                    Some(active) => active.handle_message(message),
                    None => return,
                };
                self.apply_commands(&module, commands);
            }
            AppMessage::PollTick { module, .. } => {
                if !self.focus.is_active(&module) {
                    return;
                }
                let commands = match self.registry.get_mut(&module) {
                    Some(active) => active.tick(),
                    None => return,
                };
                self.apply_commands(&module, commands);
            }
            AppMessage::HomeSummary { aggregate, .. } => {
                if self.focus.view != ViewMode::Home {
                    return;
                }
                self.home.loading = false;
                self.home.aggregate = Some(aggregate);
                self.home.updated_at = Some(chrono::Local::now());
            }
        }
        self.mark_dirty();
    }

    /// Carry out the effects a module returned.
    ///
    /// Spawned work is tagged with the current generation and `module`.
    pub(crate) fn apply_commands(&mut self, module: &str, commands: Commands) {
        for command in commands {
            match command {
                Command::Spawn(work) => {
                    let tx = self.message_tx.clone();
                    let generation = self.generation;
                    let module = module.to_string();
                    tokio::spawn(async move {
                        let message = work.await;
                        let _ = tx.send(AppMessage::ModuleResult {
                            generation,
                            module,
                            message,
                        });
                    });
                }
                Command::Ui(msg) => self.handle_ui_message(msg),
            }
        }
    }

    fn handle_ui_message(&mut self, msg: UiMessage) {
        tracing::debug!(?msg, "ui message");
        match msg {
            UiMessage::Toast(text) => self.show_toast(text),
            UiMessage::SwitchModule(key) => {
                self.enter_module(&key);
            }
            UiMessage::OpenPalette { filter } => self.open_palette(filter),
            UiMessage::GoHome => self.go_home(),
            UiMessage::Reinitialize => self.refresh_active(),
        }
    }

    pub(crate) fn stop_polling(&mut self) {
        self.poll_timer = None;
    }

    /// (Re)start polling for the active module under the current generation.
    pub(crate) fn schedule_polling(&mut self) {
        self.poll_timer = None;
        let Some(key) = self.focus.active_module.clone() else {
            return;
        };
        let interval = self
            .registry
            .get(&key)
            .and_then(|module| module.poll_interval());
        if let Some(interval) = interval.filter(|i| !i.is_zero()) {
            self.poll_timer = Some(PollTimer::start(
                key,
                self.generation,
                interval,
                self.message_tx.clone(),
            ));
        }
    }
}
