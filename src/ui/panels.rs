//! Panel renderers: header, sidebar, content pane, status bar and the
//! palette overlay.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{App, FocusArea, ViewMode};
use crate::module::ModuleState;

use super::theme::{
    COLOR_ACCENT, COLOR_BORDER, COLOR_DIALOG_BG, COLOR_DIM, COLOR_ERROR, COLOR_FOCUS,
    COLOR_HEADER, COLOR_OK, COLOR_PENDING,
};

fn panel(title: &str, focused: bool) -> Block<'_> {
    let color = if focused { COLOR_FOCUS } else { COLOR_BORDER };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(COLOR_ACCENT).add_modifier(Modifier::BOLD),
        ))
}

pub(super) fn state_color(state: ModuleState) -> ratatui::style::Color {
    match state {
        ModuleState::Loaded | ModuleState::Ready => COLOR_OK,
        ModuleState::Error => COLOR_ERROR,
        ModuleState::Loading | ModuleState::Confirming => COLOR_ACCENT,
        ModuleState::Uninitialized => COLOR_PENDING,
    }
}

pub(super) fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let view = match app.focus.view {
        ViewMode::Home => "home".to_string(),
        ViewMode::ServiceDetail => app
            .active_module()
            .map(|m| m.title().to_lowercase())
            .unwrap_or_default(),
    };
    let line = Line::from(vec![
        Span::styled(
            "cloudeck",
            Style::default().fg(COLOR_HEADER).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  project ", Style::default().fg(COLOR_DIM)),
        Span::styled(app.project().to_string(), Style::default().fg(COLOR_ACCENT)),
        Span::styled(format!("  {}", view), Style::default().fg(COLOR_DIM)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

pub(super) fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .registry
        .descriptors()
        .iter()
        .map(|descriptor| {
            let marker = match app.registry.get(&descriptor.key) {
                Some(module) => Span::styled("● ", Style::default().fg(state_color(module.state()))),
                None => Span::styled("○ ", Style::default().fg(COLOR_DIM)),
            };
            ListItem::new(Line::from(vec![marker, Span::raw(descriptor.title.clone())]))
        })
        .collect();

    let list = List::new(items)
        .block(panel("Services", app.focus.area == FocusArea::Sidebar))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(app.sidebar_index));
    frame.render_stateful_widget(list, area, &mut state);
}

pub(super) fn render_content(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus.area == FocusArea::Main;
    match app.active_module() {
        Some(module) => {
            let title = format!("{} [{}]", module.title(), module.state());
            let body = Paragraph::new(module.render())
                .block(panel(&title, focused))
                .wrap(Wrap { trim: false });
            frame.render_widget(body, area);
        }
        None => render_home(frame, area, app),
    }
}

fn render_home(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![Line::from(Span::styled(
        "Overview",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    lines.push(Line::default());

    match &app.home.aggregate {
        Some(aggregate) => {
            for (label, outcome) in aggregate.iter() {
                let title = app
                    .registry
                    .descriptor(label)
                    .map(|d| d.title.as_str())
                    .unwrap_or(label);
                let value = match outcome {
                    Ok(summary) => Span::styled(summary.clone(), Style::default().fg(COLOR_OK)),
                    Err(failure) => {
                        Span::styled(format!("error: {}", failure), Style::default().fg(COLOR_ERROR))
                    }
                };
                lines.push(Line::from(vec![Span::raw(format!("{:<12} ", title)), value]));
            }
            if let Some(updated) = app.home.updated_at {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    format!("updated {}", updated.format("%H:%M:%S")),
                    Style::default().fg(COLOR_DIM),
                )));
            }
        }
        None if app.home.loading => {
            lines.push(Line::from(Span::styled("Loading…", Style::default().fg(COLOR_PENDING))));
        }
        None => {
            lines.push(Line::from(Span::styled(
                "Select a service, or press r to load the overview.",
                Style::default().fg(COLOR_DIM),
            )));
        }
    }

    let body = Paragraph::new(lines)
        .block(panel("Home", false))
        .wrap(Wrap { trim: false });
    frame.render_widget(body, area);
}

pub(super) fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let line = if let Some(toast) = &app.toast {
        Line::from(Span::styled(toast.text.clone(), Style::default().fg(COLOR_ACCENT)))
    } else {
        let help = match (app.focus.area, app.active_module()) {
            (FocusArea::Palette, _) => "type to filter  ↑/↓: select  Enter: run  Esc: cancel".to_string(),
            (FocusArea::Main, Some(module)) => module.help_text(),
            _ => "j/k: move  Enter: open  Tab: focus  Ctrl+P: palette  q: quit".to_string(),
        };
        Line::from(Span::styled(help, Style::default().fg(COLOR_DIM)))
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Rectangle of `width` x `height` centered in `area`, clipped to it.
pub(super) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 3,
        width,
        height,
    )
}

pub(super) fn render_palette(frame: &mut Frame, area: Rect, app: &App) {
    let visible = app.palette.visible();
    let height = (visible.len() as u16).saturating_add(4).min(16);
    let popup = centered(area, 56, height);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(COLOR_FOCUS))
        .style(Style::default().bg(COLOR_DIALOG_BG))
        .title(" Command ");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [input_area, list_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("> ", Style::default().fg(COLOR_ACCENT)),
            Span::raw(app.palette.filter().to_string()),
        ])),
        input_area,
    );

    let items: Vec<ListItem> = visible
        .iter()
        .map(|entry| ListItem::new(entry.label.clone()))
        .collect();
    let list = List::new(items).highlight_style(
        Style::default()
            .fg(COLOR_ACCENT)
            .add_modifier(Modifier::REVERSED),
    );
    let mut state = ListState::default().with_selected(Some(app.palette.selected()));
    frame.render_stateful_widget(list, list_area, &mut state);
}
