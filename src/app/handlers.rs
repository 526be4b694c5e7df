//! Input routing for the App.
//!
//! Order of precedence:
//! 1. global keys (Ctrl+C)
//! 2. the palette, while open
//! 3. palette openers and Tab
//! 4. the focused area (sidebar navigation or the active module)

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{App, FocusArea, ViewMode};

impl App {
    /// Route one key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.mark_dirty();

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return;
        }

        if self.focus.palette_open() {
            self.handle_palette_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('p') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.open_palette("");
                return;
            }
            KeyCode::Tab => {
                self.toggle_focus();
                return;
            }
            _ => {}
        }

        match self.focus.area {
            FocusArea::Sidebar => self.handle_sidebar_key(key),
            FocusArea::Main => self.handle_main_key(key),
            FocusArea::Palette => {}
        }
    }

    fn handle_palette_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.close_palette(),
            KeyCode::Enter => self.run_palette_selection(),
            KeyCode::Up => self.palette.move_up(),
            KeyCode::Down => self.palette.move_down(),
            KeyCode::Backspace => self.palette.pop_char(),
            KeyCode::Char(c) => self.palette.push_char(c),
            _ => {}
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        let count = self.registry.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.sidebar_index = self.sidebar_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if count > 0 && self.sidebar_index < count - 1 {
                    self.sidebar_index += 1;
                }
            }
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                let selected = self
                    .registry
                    .keys()
                    .nth(self.sidebar_index)
                    .map(str::to_string);
                if let Some(key) = selected {
                    self.enter_module(&key);
                }
            }
            KeyCode::Char(':') => self.open_palette(""),
            KeyCode::Char('r') => self.refresh_active(),
            KeyCode::Char('h') | KeyCode::Esc if self.focus.view == ViewMode::ServiceDetail => {
                self.go_home()
            }
            KeyCode::Char('q') => self.quit(),
            _ => {}
        }
    }

    fn handle_main_key(&mut self, key: KeyEvent) {
        let Some(active) = self.focus.active_module.clone() else {
            return;
        };

        let at_root = self
            .registry
            .get(&active)
            .map(|module| module.is_at_root())
            .unwrap_or(true);
        if key.code == KeyCode::Esc && at_root {
            self.go_home();
            return;
        }

        let commands = match self.registry.get_mut(&active) {
            Some(module) => module.handle_key(key),
            None => return,
        };
        self.apply_commands(&active, commands);
    }

    /// Window size notice; forwarded to the active module.
    pub fn handle_resize(&mut self, width: u16, height: u16) {
        self.terminal_size = (width, height);
        if self.focus.view == ViewMode::ServiceDetail {
            if let Some(module) = self
                .focus
                .active_module
                .as_deref()
                .and_then(|key| self.registry.get_mut(key))
            {
                module.resize(width, height);
            }
        }
        self.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;
    use crate::registry::{ModuleDescriptor, Registry};
    use crate::testing::{test_context, FakeModule, FakeProbe};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn app_with(keys: &[&str], probe: &FakeProbe) -> App {
        let mut registry = Registry::new();
        for key in keys {
            let probe = probe.clone();
            let module_key = key.to_string();
            registry
                .register(ModuleDescriptor::new(*key, key.to_uppercase(), move |_ctx| {
                    Ok(Box::new(FakeModule::new(&module_key, probe.clone())) as Box<dyn Module>)
                }))
                .unwrap();
        }
        App::with_context(registry, test_context("alpha"))
    }

    #[tokio::test]
    async fn test_sidebar_navigation_enters_module() {
        let probe = FakeProbe::default();
        let mut app = app_with(&["a", "b"], &probe);

        app.handle_key(press(KeyCode::Char('j')));
        app.handle_key(press(KeyCode::Char('j')));
        assert_eq!(app.sidebar_index, 1);
        app.handle_key(press(KeyCode::Enter));

        assert_eq!(app.focus.active_module.as_deref(), Some("b"));
        assert_eq!(app.focus.area, FocusArea::Main);
    }

    #[tokio::test]
    async fn test_esc_at_root_leaves_module() {
        let probe = FakeProbe::default();
        let mut app = app_with(&["a"], &probe);
        app.enter_module("a");

        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Esc));
        assert_eq!(app.focus.view, ViewMode::ServiceDetail, "module handled back");

        app.handle_key(press(KeyCode::Esc));
        assert_eq!(app.focus.view, ViewMode::Home);
    }

    #[tokio::test]
    async fn test_tab_toggles_focus_symmetrically() {
        let probe = FakeProbe::default();
        let mut app = app_with(&["a"], &probe);
        app.enter_module("a");

        app.handle_key(press(KeyCode::Tab));
        assert_eq!(app.focus.area, FocusArea::Sidebar);
        app.handle_key(press(KeyCode::Tab));
        assert_eq!(app.focus.area, FocusArea::Main);

        assert_eq!(probe.focused(), 2);
        assert_eq!(probe.blurred(), 1);
    }

    #[tokio::test]
    async fn test_palette_captures_keys_until_closed() {
        let probe = FakeProbe::default();
        let mut app = app_with(&["a"], &probe);

        app.handle_key(ctrl('p'));
        assert!(app.focus.palette_open());

        app.handle_key(press(KeyCode::Char('q')));
        assert!(!app.should_quit, "typed into the filter");
        assert_eq!(app.palette.filter(), "q");

        app.handle_key(press(KeyCode::Esc));
        assert_eq!(app.focus.area, FocusArea::Sidebar);
        assert_eq!(app.palette.filter(), "");
    }

    #[tokio::test]
    async fn test_module_ui_message_opens_palette() {
        let probe = FakeProbe::default();
        let mut app = app_with(&["a"], &probe);
        app.enter_module("a");

        app.handle_key(press(KeyCode::Char('p')));
        assert!(app.focus.palette_open());
        assert_eq!(app.palette.filter(), "project");
        assert_eq!(app.focus.palette_return, Some(FocusArea::Main));
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_from_palette() {
        let mut app = app_with(&[], &FakeProbe::default());
        app.handle_key(ctrl('p'));
        app.handle_key(ctrl('c'));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_resize_forwarded_to_active_module() {
        let probe = FakeProbe::default();
        let mut app = app_with(&["a"], &probe);
        app.handle_resize(80, 24);
        app.enter_module("a");
        assert_eq!(probe.resized(), Some((80, 24)));

        app.handle_resize(120, 40);
        assert_eq!(probe.resized(), Some((120, 40)));
    }
}
