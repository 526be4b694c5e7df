//! Test doubles for the module layer.
//!
//! [`FakeModule`] reports every lifecycle call to a shared [`FakeProbe`] so a
//! test can hold the probe while the registry owns the module.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};

use crate::adapters::MockHttpClient;
use crate::cache::TtlCache;
use crate::config::AppConfig;
use crate::error::ModuleError;
use crate::gateway::{Gateway, RetryPolicy};
use crate::module::{Commands, Lifecycle, Module, ModuleContext, ModuleMessage, ModuleState, UiMessage};

/// Context over fresh in-memory services, pointed at `project`.
pub fn test_context(project: &str) -> ModuleContext {
    let config = AppConfig::default().with_project(project);
    context_with(config, Arc::new(MockHttpClient::new()))
}

/// Context over `config` and a caller-held mock client.
pub fn context_with(config: AppConfig, http: Arc<MockHttpClient>) -> ModuleContext {
    let policy = RetryPolicy::default()
        .with_jitter(false)
        .with_base_delay(Duration::from_millis(10));
    let gateway = Gateway::new(config.rate_limit, policy);
    ModuleContext::new(
        Arc::new(config),
        Arc::new(TtlCache::new()),
        Arc::new(gateway),
        http,
    )
}

/// Payload produced by a [`FakeModule`] fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeLoaded {
    pub project: String,
    pub fetch: u32,
}

#[derive(Debug, Default)]
struct ProbeState {
    constructed: u32,
    initialized: u32,
    reinitialized: u32,
    init_failures: u32,
    focused: u32,
    blurred: u32,
    ticks: u32,
    fetches: u32,
    delivered: Vec<FakeLoaded>,
    last_project: Option<String>,
    fetch_delay: Option<Duration>,
    poll_interval: Option<Duration>,
    resized: Option<(u16, u16)>,
}

/// Shared view of what happened to one or more [`FakeModule`]s.
#[derive(Debug, Clone, Default)]
pub struct FakeProbe(Arc<Mutex<ProbeState>>);

impl FakeProbe {
    fn lock(&self) -> MutexGuard<'_, ProbeState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `n` initialize/reinitialize calls fail.
    pub fn fail_next_inits(&self, n: u32) {
        self.lock().init_failures = n;
    }

    /// Hold every fetch for `delay` before it completes.
    pub fn set_fetch_delay(&self, delay: Duration) {
        self.lock().fetch_delay = Some(delay);
    }

    pub fn set_poll_interval(&self, interval: Duration) {
        self.lock().poll_interval = Some(interval);
    }

    pub fn constructed(&self) -> u32 {
        self.lock().constructed
    }

    pub fn initialized(&self) -> u32 {
        self.lock().initialized
    }

    pub fn reinitialized(&self) -> u32 {
        self.lock().reinitialized
    }

    pub fn focused(&self) -> u32 {
        self.lock().focused
    }

    pub fn blurred(&self) -> u32 {
        self.lock().blurred
    }

    pub fn ticks(&self) -> u32 {
        self.lock().ticks
    }

    pub fn fetches(&self) -> u32 {
        self.lock().fetches
    }

    /// Fetch results the module accepted, in arrival order.
    pub fn delivered(&self) -> Vec<FakeLoaded> {
        self.lock().delivered.clone()
    }

    pub fn last_project(&self) -> Option<String> {
        self.lock().last_project.clone()
    }

    pub fn resized(&self) -> Option<(u16, u16)> {
        self.lock().resized
    }

    fn take_init_failure(&self) -> bool {
        let mut state = self.lock();
        if state.init_failures > 0 {
            state.init_failures -= 1;
            true
        } else {
            false
        }
    }
}

/// Scriptable module.
///
/// Keys: `Enter` descends one level, `Esc` climbs back, `g` asks for Home,
/// `p` opens the project palette, `r` refreshes (or asks to be set up again
/// after a failed initialization). Any other key is ignored.
pub struct FakeModule {
    key: String,
    title: String,
    project: Option<String>,
    lifecycle: Lifecycle,
    depth: u32,
    probe: FakeProbe,
}

impl FakeModule {
    pub fn new(key: &str, probe: FakeProbe) -> Self {
        probe.lock().constructed += 1;
        Self {
            key: key.to_string(),
            title: key.to_uppercase(),
            project: None,
            lifecycle: Lifecycle::new(),
            depth: 0,
            probe,
        }
    }

    fn setup(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError> {
        if self.probe.take_init_failure() {
            self.lifecycle.init_failed();
            return Err(ModuleError::init(&self.key, "scripted failure"));
        }
        self.project = Some(ctx.project.clone());
        self.probe.lock().last_project = Some(ctx.project.clone());
        self.lifecycle.initialized();
        Ok(())
    }
}

impl Module for FakeModule {
    fn key(&self) -> &str {
        &self.key
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn state(&self) -> ModuleState {
        self.lifecycle.state()
    }

    fn initialize(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError> {
        self.probe.lock().initialized += 1;
        self.setup(ctx)
    }

    fn reinitialize(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError> {
        if self.lifecycle.is_initialized() && self.project.as_deref() == Some(ctx.project.as_str()) {
            return Ok(());
        }
        self.probe.lock().reinitialized += 1;
        self.lifecycle.teardown();
        self.depth = 0;
        self.setup(ctx)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Commands {
        match key.code {
            KeyCode::Enter => {
                self.depth += 1;
                Commands::none()
            }
            KeyCode::Esc => {
                self.depth = self.depth.saturating_sub(1);
                Commands::none()
            }
            KeyCode::Char('g') => Commands::ui(UiMessage::GoHome),
            KeyCode::Char('r') if !self.lifecycle.is_initialized() => {
                Commands::ui(UiMessage::Reinitialize)
            }
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('p') => Commands::ui(UiMessage::OpenPalette {
                filter: "project".to_string(),
            }),
            _ => Commands::none(),
        }
    }

    fn handle_message(&mut self, msg: ModuleMessage) -> Commands {
        if let Ok(loaded) = msg.downcast::<FakeLoaded>() {
            if self.lifecycle.load_succeeded() {
                self.probe.lock().delivered.push(loaded);
            }
        }
        Commands::none()
    }

    fn refresh(&mut self) -> Commands {
        if !self.lifecycle.begin_refresh() {
            return Commands::none();
        }
        let (fetch, delay) = {
            let mut state = self.probe.lock();
            state.fetches += 1;
            (state.fetches, state.fetch_delay)
        };
        let project = self.project.clone().unwrap_or_default();
        Commands::spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            FakeLoaded { project, fetch }
        })
    }

    fn reset(&mut self) {
        self.depth = 0;
        self.lifecycle.reset();
    }

    fn tick(&mut self) -> Commands {
        self.probe.lock().ticks += 1;
        self.refresh()
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.probe.lock().resized = Some((width, height));
    }

    fn focus(&mut self) {
        self.probe.lock().focused += 1;
    }

    fn blur(&mut self) {
        self.probe.lock().blurred += 1;
    }

    fn is_at_root(&self) -> bool {
        self.depth == 0
    }

    fn render(&self) -> String {
        format!(
            "{} [{}] {}",
            self.title,
            self.lifecycle.state(),
            self.project.as_deref().unwrap_or("-")
        )
    }

    fn help_text(&self) -> String {
        "Enter: open  Esc: back".to_string()
    }

    fn poll_interval(&self) -> Option<Duration> {
        self.probe.lock().poll_interval
    }
}
