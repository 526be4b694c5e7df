//! Color theme constants.

use ratatui::style::Color;

/// Panel borders.
pub const COLOR_BORDER: Color = Color::DarkGray;

/// Border of the focused panel.
pub const COLOR_FOCUS: Color = Color::White;

/// Highlights and titles.
pub const COLOR_ACCENT: Color = Color::Rgb(0, 122, 204); // blue #007ACC

pub const COLOR_HEADER: Color = Color::White;

/// Loaded / healthy.
pub const COLOR_OK: Color = Color::Rgb(4, 181, 117); // green #04B575

/// Loading / pending.
pub const COLOR_PENDING: Color = Color::Gray;

pub const COLOR_ERROR: Color = Color::Red;

/// Dim text for less important info.
pub const COLOR_DIM: Color = Color::DarkGray;

/// Background of the palette overlay.
pub const COLOR_DIALOG_BG: Color = Color::Rgb(10, 15, 35);
