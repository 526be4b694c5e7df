//! Command palette overlay.

/// What a palette entry does when chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteAction {
    GoHome,
    OpenModule(String),
    SwitchProject(String),
    Refresh,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    pub label: String,
    pub action: PaletteAction,
}

impl PaletteEntry {
    pub fn new(label: impl Into<String>, action: PaletteAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Filterable list of entries with a selection.
///
/// The selection indexes into the *filtered* list and is clamped whenever
/// the filter changes.
#[derive(Debug, Clone, Default)]
pub struct CommandPalette {
    entries: Vec<PaletteEntry>,
    filter: String,
    selected: usize,
}

impl CommandPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entries and start from `filter`.
    pub fn load(&mut self, entries: Vec<PaletteEntry>, filter: impl Into<String>) {
        self.entries = entries;
        self.filter = filter.into();
        self.selected = 0;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.filter.clear();
        self.selected = 0;
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Entries whose label contains the filter, case-insensitively.
    pub fn visible(&self) -> Vec<&PaletteEntry> {
        let needle = self.filter.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.label.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn push_char(&mut self, c: char) {
        self.filter.push(c);
        self.clamp();
    }

    pub fn pop_char(&mut self) {
        self.filter.pop();
        self.clamp();
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let count = self.visible().len();
        if count > 0 && self.selected < count - 1 {
            self.selected += 1;
        }
    }

    pub fn selected_action(&self) -> Option<PaletteAction> {
        self.visible()
            .get(self.selected)
            .map(|entry| entry.action.clone())
    }

    fn clamp(&mut self) {
        let count = self.visible().len();
        if self.selected >= count {
            self.selected = count.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> CommandPalette {
        let mut palette = CommandPalette::new();
        palette.load(
            vec![
                PaletteEntry::new("Go home", PaletteAction::GoHome),
                PaletteEntry::new("Open Buckets", PaletteAction::OpenModule("buckets".into())),
                PaletteEntry::new("Switch project: alpha", PaletteAction::SwitchProject("alpha".into())),
                PaletteEntry::new("Switch project: beta", PaletteAction::SwitchProject("beta".into())),
                PaletteEntry::new("Quit", PaletteAction::Quit),
            ],
            "",
        );
        palette
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let mut palette = palette();
        for c in "PROJECT".chars() {
            palette.push_char(c);
        }
        let labels: Vec<&str> = palette.visible().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Switch project: alpha", "Switch project: beta"]);
    }

    #[test]
    fn test_selection_clamped_when_filter_narrows() {
        let mut palette = palette();
        palette.move_down();
        palette.move_down();
        palette.move_down();
        assert_eq!(palette.selected(), 3);

        palette.push_char('q');
        assert_eq!(palette.selected(), 0);
        assert_eq!(palette.selected_action(), Some(PaletteAction::Quit));
    }

    #[test]
    fn test_no_match_has_no_action() {
        let mut palette = palette();
        palette.load(palette.entries.clone(), "zzz");
        assert!(palette.visible().is_empty());
        assert_eq!(palette.selected_action(), None);
        palette.move_down();
        assert_eq!(palette.selected(), 0);
    }

    #[test]
    fn test_backspace_widens_filter() {
        let mut palette = palette();
        palette.load(palette.entries.clone(), "beta");
        assert_eq!(palette.visible().len(), 1);
        for _ in 0..4 {
            palette.pop_char();
        }
        assert_eq!(palette.visible().len(), 5);
    }
}
