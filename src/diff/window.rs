//! Collapses unchanged context into expandable hunks for display.

use crate::domain::{DiffRow, HunkPlaceholder};
use std::collections::HashSet;

pub const DEFAULT_CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOptions {
    pub context_lines: usize,
    pub show_full_file: bool,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
            show_full_file: false,
        }
    }
}

/// One display slot: either a row (by index into the row model) or a collapsed hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowItem {
    Row(usize),
    Hunk(HunkPlaceholder),
}

/// Flags every row within `context_lines` of a changed row.
pub fn kept_rows(rows: &[DiffRow], context_lines: usize) -> Vec<bool> {
    let mut kept = vec![false; rows.len()];
    for (idx, row) in rows.iter().enumerate() {
        if !row.is_change() {
            continue;
        }
        let start = idx.saturating_sub(context_lines);
        let end = idx
            .saturating_add(context_lines)
            .saturating_add(1)
            .min(rows.len());
        for flag in &mut kept[start..end] {
            *flag = true;
        }
    }
    kept
}

/// Windowed layout of `rows` with every unkept run collapsed into a placeholder.
pub fn window_rows(rows: &[DiffRow], options: WindowOptions) -> Vec<WindowItem> {
    if options.show_full_file {
        return (0..rows.len()).map(WindowItem::Row).collect();
    }

    let kept = kept_rows(rows, options.context_lines);
    let mut items = Vec::new();
    let mut idx = 0usize;

    while idx < rows.len() {
        if kept[idx] {
            items.push(WindowItem::Row(idx));
            idx += 1;
            continue;
        }

        let start = idx;
        while idx < rows.len() && !kept[idx] {
            idx += 1;
        }
        items.push(WindowItem::Hunk(HunkPlaceholder::new(start, idx)));
    }

    items
}

/// Per-view windowing state: full-file toggle plus the set of expanded hunk ids.
#[derive(Debug, Clone)]
pub struct WindowState {
    pub context_lines: usize,
    show_full_file: bool,
    expanded: HashSet<String>,
}

impl Default for WindowState {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_LINES, false)
    }
}

impl WindowState {
    pub fn new(context_lines: usize, show_full_file: bool) -> Self {
        Self {
            context_lines,
            show_full_file,
            expanded: HashSet::new(),
        }
    }

    pub fn options(&self) -> WindowOptions {
        WindowOptions {
            context_lines: self.context_lines,
            show_full_file: self.show_full_file,
        }
    }

    pub fn show_full_file(&self) -> bool {
        self.show_full_file
    }

    /// Flips the full-file view and starts over from a fully collapsed context view.
    pub fn toggle_full_file(&mut self) {
        self.show_full_file = !self.show_full_file;
        self.expanded.clear();
    }

    pub fn is_expanded(&self, hunk_id: &str) -> bool {
        self.expanded.contains(hunk_id)
    }

    pub fn expand(&mut self, hunk_id: &str) {
        self.expanded.insert(hunk_id.to_string());
    }

    pub fn collapse(&mut self, hunk_id: &str) {
        self.expanded.remove(hunk_id);
    }

    /// Returns the new expanded state of `hunk_id`.
    pub fn toggle_hunk(&mut self, hunk_id: &str) -> bool {
        if self.expanded.remove(hunk_id) {
            false
        } else {
            self.expanded.insert(hunk_id.to_string());
            true
        }
    }

    /// Display items with expanded placeholders replaced by their rows.
    pub fn visible_items(&self, rows: &[DiffRow]) -> Vec<WindowItem> {
        let mut items = Vec::new();
        for item in window_rows(rows, self.options()) {
            match item {
                WindowItem::Hunk(hunk) if self.is_expanded(&hunk.id) => {
                    items.extend((hunk.start_index..hunk.end_index).map(WindowItem::Row));
                }
                other => items.push(other),
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows_with_changes(len: usize, changed: &[usize]) -> Vec<DiffRow> {
        (0..len)
            .map(|i| {
                if changed.contains(&i) {
                    DiffRow::modified(Some("old"), Some("new"))
                } else {
                    DiffRow::context("same")
                }
            })
            .collect()
    }

    fn hunks(items: &[WindowItem]) -> Vec<&HunkPlaceholder> {
        items
            .iter()
            .filter_map(|item| match item {
                WindowItem::Hunk(h) => Some(h),
                WindowItem::Row(_) => None,
            })
            .collect()
    }

    fn row_indices(items: &[WindowItem]) -> Vec<usize> {
        items
            .iter()
            .filter_map(|item| match item {
                WindowItem::Row(i) => Some(*i),
                WindowItem::Hunk(_) => None,
            })
            .collect()
    }

    #[test]
    fn collapses_both_sides_of_a_single_change() {
        let rows = rows_with_changes(10, &[5]);
        let items = window_rows(
            &rows,
            WindowOptions {
                context_lines: 1,
                show_full_file: false,
            },
        );

        assert_eq!(row_indices(&items), vec![4, 5, 6]);
        let hunks = hunks(&items);
        assert_eq!(hunks.len(), 2);
        assert_eq!((hunks[0].id.as_str(), hunks[0].count), ("0-4", 4));
        assert_eq!((hunks[1].id.as_str(), hunks[1].count), ("7-10", 3));
    }

    #[test]
    fn full_file_shows_every_row() {
        let rows = rows_with_changes(6, &[0]);
        let items = window_rows(
            &rows,
            WindowOptions {
                context_lines: 0,
                show_full_file: true,
            },
        );
        assert_eq!(row_indices(&items), (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn changed_rows_are_never_hidden() {
        let rows = rows_with_changes(40, &[0, 9, 10, 25, 39]);
        for context_lines in 0..5 {
            let kept = kept_rows(&rows, context_lines);
            for (idx, row) in rows.iter().enumerate() {
                if row.is_change() {
                    assert!(kept[idx], "row {idx} hidden with context {context_lines}");
                }
            }
        }
    }

    #[test]
    fn huge_context_keeps_every_row() {
        let rows = vec![DiffRow::context("same"), DiffRow::added("new")];
        assert_eq!(kept_rows(&rows, usize::MAX), vec![true, true]);

        let items = window_rows(
            &rows,
            WindowOptions {
                context_lines: usize::MAX,
                show_full_file: false,
            },
        );
        assert_eq!(row_indices(&items), vec![0, 1]);
    }

    #[test]
    fn rows_without_changes_collapse_entirely() {
        let rows = rows_with_changes(5, &[]);
        let items = window_rows(&rows, WindowOptions::default());
        assert_eq!(items, vec![WindowItem::Hunk(HunkPlaceholder::new(0, 5))]);
    }

    #[test]
    fn expanding_one_hunk_leaves_others_collapsed() {
        let rows = rows_with_changes(10, &[5]);
        let mut state = WindowState::new(1, false);

        state.expand("0-4");
        let items = state.visible_items(&rows);

        assert_eq!(row_indices(&items), vec![0, 1, 2, 3, 4, 5, 6]);
        let remaining = hunks(&items);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "7-10");

        assert!(!state.toggle_hunk("0-4"));
        assert_eq!(hunks(&state.visible_items(&rows)).len(), 2);
    }

    #[test]
    fn toggling_full_file_clears_expanded_hunks() {
        let rows = rows_with_changes(10, &[5]);
        let mut state = WindowState::new(1, false);
        state.expand("7-10");

        state.toggle_full_file();
        assert!(state.show_full_file());
        assert!(!state.is_expanded("7-10"));

        state.toggle_full_file();
        assert_eq!(hunks(&state.visible_items(&rows)).len(), 2);
    }
}
