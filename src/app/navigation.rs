//! Navigation methods for the App.
//!
//! Every transition that changes which module is active, or which project
//! modules point at, bumps the generation first so results already in flight
//! are dropped when they arrive.

use crate::aggregator::TaskSet;
use crate::module::ModuleState;

use super::{App, AppMessage, FocusArea, PaletteAction, PaletteEntry, ViewMode};

impl App {
    /// Make `key` the active module and show it.
    ///
    /// If the module cannot be constructed or initialized the view does not
    /// change; the error is surfaced instead. Returns whether the module is
    /// now active.
    pub fn enter_module(&mut self, key: &str) -> bool {
        self.close_palette();

        if self.focus.is_active(key) {
            if !self.registry.is_initialized(key) {
                if !self.recover_module(key) {
                    return false;
                }
                self.refresh_module(key);
                self.schedule_polling();
            }
            self.set_focus(FocusArea::Main);
            return true;
        }

        let entered = self.registry.get_or_initialize(key, &self.ctx).map(|_| ());
        if let Err(err) = entered {
            self.surface_error(err.to_string());
            return false;
        }

        self.leave_active_module();
        self.generation += 1;
        tracing::info!(module = key, generation = self.generation, "entering module");

        self.focus.view = ViewMode::ServiceDetail;
        self.focus.active_module = Some(key.to_string());
        if let Some(idx) = self.registry.keys().position(|k| k == key) {
            self.sidebar_index = idx;
        }
        self.last_error = None;

        let (width, height) = self.terminal_size;
        let commands = match self.registry.get_mut(key) {
            Some(module) => {
                if width > 0 && height > 0 {
                    module.resize(width, height);
                }
                module.refresh()
            }
            None => return false,
        };
        self.apply_commands(key, commands);
        self.schedule_polling();
        self.set_focus(FocusArea::Main);
        self.mark_dirty();
        true
    }

    /// Leave the active module and show the Home overview.
    pub fn go_home(&mut self) {
        self.close_palette();
        self.leave_active_module();
        self.generation += 1;
        self.focus.view = ViewMode::Home;
        self.focus.active_module = None;
        if self.focus.area == FocusArea::Main {
            self.focus.area = FocusArea::Sidebar;
        }
        if self.focus.palette_return == Some(FocusArea::Main) {
            self.focus.palette_return = Some(FocusArea::Sidebar);
        }
        self.refresh_home();
        self.mark_dirty();
    }

    /// Point every constructed module at `project`.
    ///
    /// Modules that fail to reinitialize are left in their error state and
    /// reported one by one; the others carry on.
    pub fn switch_project(&mut self, project: &str) {
        if self.ctx.project == project {
            return;
        }
        tracing::info!(from = %self.ctx.project, to = project, "switching project");

        self.generation += 1;
        self.ctx = self.ctx.with_project(project);

        let failures = self.registry.reinitialize_all(&self.ctx);
        for failure in &failures {
            self.surface_error(failure.to_string());
        }
        if failures.is_empty() {
            self.show_toast(format!("Project: {}", project));
        }

        match self.focus.active_module.clone() {
            Some(key) if self.focus.view == ViewMode::ServiceDetail => {
                let commands = match self.registry.get_mut(&key) {
                    Some(module) => module.refresh(),
                    None => return,
                };
                self.apply_commands(&key, commands);
                self.schedule_polling();
            }
            _ => self.refresh_home(),
        }
        self.mark_dirty();
    }

    /// Move input focus, notifying the active module when Main gains or
    /// loses it.
    pub fn set_focus(&mut self, area: FocusArea) {
        let previous = self.focus.area;
        if previous == area {
            return;
        }
        if area == FocusArea::Main && self.focus.view != ViewMode::ServiceDetail {
            return;
        }

        let active = self.focus.active_module.clone();
        if let Some(module) = active.as_deref().and_then(|key| self.registry.get_mut(key)) {
            if previous == FocusArea::Main {
                module.blur();
            }
            if area == FocusArea::Main {
                module.focus();
            }
        }
        self.focus.area = area;
        self.mark_dirty();
    }

    /// Sidebar <-> Main.
    pub fn toggle_focus(&mut self) {
        let next = match self.focus.area {
            FocusArea::Sidebar => FocusArea::Main,
            FocusArea::Main => FocusArea::Sidebar,
            FocusArea::Palette => return,
        };
        self.set_focus(next);
    }

    /// Open the palette over the current view.
    pub fn open_palette(&mut self, filter: impl Into<String>) {
        if self.focus.palette_open() {
            return;
        }
        let entries = self.palette_entries();
        self.palette.load(entries, filter);
        let previous = self.focus.area;
        self.set_focus(FocusArea::Palette);
        self.focus.palette_return = Some(previous);
    }

    /// Close the palette and restore the focus it was opened from.
    pub fn close_palette(&mut self) {
        if !self.focus.palette_open() {
            return;
        }
        let previous = self.focus.palette_return.take().unwrap_or_default();
        self.palette.clear();
        let restore = if previous == FocusArea::Main && self.focus.view != ViewMode::ServiceDetail {
            FocusArea::Sidebar
        } else {
            previous
        };
        self.set_focus(restore);
    }

    /// Close the palette, then carry out the selected entry.
    pub fn run_palette_selection(&mut self) {
        let action = self.palette.selected_action();
        self.close_palette();
        if let Some(action) = action {
            self.run_action(action);
        }
    }

    pub fn run_action(&mut self, action: PaletteAction) {
        tracing::debug!(?action, "palette action");
        match action {
            PaletteAction::GoHome => self.go_home(),
            PaletteAction::OpenModule(key) => {
                self.enter_module(&key);
            }
            PaletteAction::SwitchProject(project) => self.switch_project(&project),
            PaletteAction::Refresh => self.refresh_active(),
            PaletteAction::Quit => self.quit(),
        }
    }

    fn palette_entries(&self) -> Vec<PaletteEntry> {
        let mut entries = vec![PaletteEntry::new("Go home", PaletteAction::GoHome)];
        entries.extend(self.registry.descriptors().iter().map(|d| {
            PaletteEntry::new(
                format!("Open {}", d.title),
                PaletteAction::OpenModule(d.key.clone()),
            )
        }));
        entries.extend(self.config().projects.iter().map(|p| {
            PaletteEntry::new(
                format!("Switch project: {}", p),
                PaletteAction::SwitchProject(p.clone()),
            )
        }));
        entries.push(PaletteEntry::new("Refresh", PaletteAction::Refresh));
        entries.push(PaletteEntry::new("Quit", PaletteAction::Quit));
        entries
    }

    /// Refresh whatever is on screen.
    ///
    /// An active module whose initialization failed is initialized again
    /// first.
    pub fn refresh_active(&mut self) {
        match self.focus.active_module.clone() {
            Some(key) if self.focus.view == ViewMode::ServiceDetail => {
                if self.recover_module(&key) {
                    self.refresh_module(&key);
                }
            }
            _ => self.refresh_home(),
        }
    }

    fn refresh_module(&mut self, key: &str) {
        let commands = match self.registry.get_mut(key) {
            Some(module) => module.refresh(),
            None => return,
        };
        self.apply_commands(key, commands);
    }

    /// Retry `initialize` for a constructed module left uninitialized by an
    /// earlier failure. Returns false, with the error surfaced, if it fails
    /// again.
    fn recover_module(&mut self, key: &str) -> bool {
        if !self.registry.is_constructed(key) || self.registry.is_initialized(key) {
            return true;
        }
        tracing::info!(module = key, project = %self.ctx.project, "retrying initialization");
        match self.registry.get_or_initialize(key, &self.ctx).map(|_| ()) {
            Ok(()) => {
                self.last_error = None;
                true
            }
            Err(err) => {
                self.surface_error(err.to_string());
                false
            }
        }
    }

    /// Fan the summary queries of every module out and collect them into the
    /// Home overview.
    pub fn refresh_home(&mut self) {
        let queries = self.registry.summary_queries(&self.ctx);
        if queries.is_empty() {
            return;
        }

        let mut tasks = TaskSet::new();
        for (label, query) in queries {
            if let Err(err) = tasks.add(label, query) {
                tracing::warn!(error = %err, "skipping summary query");
            }
        }

        self.home.loading = true;
        let tx = self.message_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let aggregate = tasks.aggregate().await;
            let _ = tx.send(AppMessage::HomeSummary {
                generation,
                aggregate,
            });
        });
    }

    /// Stop polling and notify the outgoing module.
    ///
    /// A module left mid-fetch is reset: its result will be dropped as stale,
    /// so it would otherwise stay Loading forever.
    fn leave_active_module(&mut self) {
        self.stop_polling();
        let Some(key) = self.focus.active_module.clone() else {
            return;
        };
        let was_main = self.focus.area == FocusArea::Main;
        if let Some(module) = self.registry.get_mut(&key) {
            if was_main {
                module.blur();
            }
            if module.state() == ModuleState::Loading {
                module.reset();
            }
        }
        if was_main {
            self.focus.area = FocusArea::Sidebar;
        }
    }
}
