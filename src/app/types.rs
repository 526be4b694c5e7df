//! Type definitions for the application state.
//!
//! - [`ViewMode`] - Home overview or a module's detail view
//! - [`FocusArea`] - which region receives input
//! - [`FocusState`] - the combination of both plus the active module
//! - [`HomeOverview`] - aggregated summaries shown on Home
//! - [`Toast`] - transient status-bar message

use chrono::{DateTime, Local};

use crate::aggregator::Aggregate;

/// Which view fills the content pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Home,
    ServiceDetail,
}

/// Which region receives input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusArea {
    #[default]
    Sidebar,
    Main,
    /// Overlay; the area it was opened from is remembered in [`FocusState`].
    Palette,
}

/// Focus state of the orchestrator.
///
/// Valid combinations:
/// - `Home`: no active module, focus on `Sidebar` or `Palette`
/// - `ServiceDetail`: an active module, focus on any area
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FocusState {
    pub view: ViewMode,
    pub area: FocusArea,
    pub active_module: Option<String>,
    /// Area to restore when the palette closes.
    pub palette_return: Option<FocusArea>,
}

impl FocusState {
    pub fn palette_open(&self) -> bool {
        self.area == FocusArea::Palette
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.view == ViewMode::ServiceDetail && self.active_module.as_deref() == Some(key)
    }

    /// Whether the combination is one of the documented valid states.
    pub fn is_consistent(&self) -> bool {
        let palette_ok = self.palette_open() == self.palette_return.is_some();
        let view_ok = match self.view {
            ViewMode::Home => {
                self.active_module.is_none()
                    && self.area != FocusArea::Main
                    && self.palette_return != Some(FocusArea::Main)
            }
            ViewMode::ServiceDetail => self.active_module.is_some(),
        };
        palette_ok && view_ok
    }
}

/// Summaries shown on the Home view.
#[derive(Debug, Clone, Default)]
pub struct HomeOverview {
    pub loading: bool,
    pub aggregate: Option<Aggregate>,
    pub updated_at: Option<DateTime<Local>>,
}

/// Status-bar message that disappears after a number of ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub text: String,
    pub expires_at_tick: u64,
}
