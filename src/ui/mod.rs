//! UI rendering.
//!
//! The view is derived from [`App`] on every draw; nothing here mutates
//! state.
//!
//! ```text
//! header
//! sidebar | content (Home overview or active module)
//! status bar (toast or key help)
//! ```
//!
//! The palette is drawn last, over everything else.

mod panels;
mod theme;

use ratatui::layout::{Constraint, Layout};
use ratatui::Frame;

use crate::app::App;

/// Sidebar width in columns.
const SIDEBAR_WIDTH: u16 = 22;

pub fn render(frame: &mut Frame, app: &App) {
    let [header, body, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());
    let [sidebar, content] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(10)]).areas(body);

    panels::render_header(frame, header, app);
    panels::render_sidebar(frame, sidebar, app);
    panels::render_content(frame, content, app);
    panels::render_status_bar(frame, status, app);

    if app.focus.palette_open() {
        panels::render_palette(frame, frame.area(), app);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::TaskSet;
    use crate::error::ModuleError;
    use crate::module::Module;
    use crate::registry::{ModuleDescriptor, Registry};
    use crate::testing::{test_context, FakeModule, FakeProbe};
    use ratatui::backend::TestBackend;
    use ratatui::layout::Rect;
    use ratatui::Terminal;

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

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_home_lists_services() {
        let app = app_with(&["queues", "buckets"], &FakeProbe::default());
        let screen = draw(&app);
        assert!(screen.contains("cloudeck"));
        assert!(screen.contains("QUEUES"));
        assert!(screen.contains("BUCKETS"));
        assert!(screen.contains("Overview"));
    }

    #[tokio::test]
    async fn test_active_module_rendered_in_content() {
        let mut app = app_with(&["queues"], &FakeProbe::default());
        app.enter_module("queues");
        let screen = draw(&app);
        assert!(screen.contains("QUEUES [loading] alpha"));
        assert!(screen.contains("Enter: open  Esc: back"));
    }

    #[tokio::test]
    async fn test_home_overview_marks_failed_summary() {
        let mut app = app_with(&["queues", "buckets"], &FakeProbe::default());
        let mut tasks = TaskSet::new();
        tasks.add("queues", async { Ok("2 queues".to_string()) }).unwrap();
        tasks
            .add("buckets", async {
                Err(ModuleError::Decode {
                    what: "buckets".to_string(),
                    message: "bad json".to_string(),
                })
            })
            .unwrap();
        app.home.aggregate = Some(tasks.aggregate().await);

        let screen = draw(&app);
        assert!(screen.contains("QUEUES       2 queues"));
        assert!(screen.contains("BUCKETS      error: could not decode buckets: bad json"));
    }

    #[test]
    fn test_palette_overlay_and_toast() {
        let mut app = app_with(&["queues"], &FakeProbe::default());
        app.open_palette("open");
        app.show_toast("Project: beta");
        let screen = draw(&app);
        assert!(screen.contains("Command"));
        assert!(screen.contains("Open QUEUES"));
        assert!(screen.contains("Project: beta"));
    }

    #[test]
    fn test_centered_is_clipped() {
        let area = Rect::new(0, 0, 40, 10);
        let popup = panels::centered(area, 56, 16);
        assert_eq!(popup.width, 40);
        assert_eq!(popup.height, 10);
    }
}
