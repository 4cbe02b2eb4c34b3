//! Row model shared by the diff builder, the windowing pass and renderers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Context,
    Added,
    Removed,
    /// Member of a replacement block (removed lines followed by added lines).
    Modified,
}

/// One side-by-side row of a dual-pane diff.
///
/// A missing side carries an empty string. Padding members of an
/// unequal-length modified block keep `kind == Modified` while one of
/// `has_left` / `has_right` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRow {
    pub kind: RowKind,
    pub left: String,
    pub right: String,
    pub has_left: bool,
    pub has_right: bool,
    pub old_line_number: Option<usize>,
    pub new_line_number: Option<usize>,
}

impl DiffRow {
    pub fn context(text: &str) -> Self {
        Self {
            kind: RowKind::Context,
            left: text.to_string(),
            right: text.to_string(),
            has_left: true,
            has_right: true,
            old_line_number: None,
            new_line_number: None,
        }
    }

    pub fn added(text: &str) -> Self {
        Self {
            kind: RowKind::Added,
            left: String::new(),
            right: text.to_string(),
            has_left: false,
            has_right: true,
            old_line_number: None,
            new_line_number: None,
        }
    }

    pub fn removed(text: &str) -> Self {
        Self {
            kind: RowKind::Removed,
            left: text.to_string(),
            right: String::new(),
            has_left: true,
            has_right: false,
            old_line_number: None,
            new_line_number: None,
        }
    }

    pub fn modified(left: Option<&str>, right: Option<&str>) -> Self {
        Self {
            kind: RowKind::Modified,
            left: left.unwrap_or_default().to_string(),
            right: right.unwrap_or_default().to_string(),
            has_left: left.is_some(),
            has_right: right.is_some(),
            old_line_number: None,
            new_line_number: None,
        }
    }

    pub fn is_change(&self) -> bool {
        self.kind != RowKind::Context
    }
}

/// A run of text inside a modified row, flagged when it differs from the other side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSpan {
    pub text: String,
    pub changed: bool,
}

impl WordSpan {
    pub fn new(text: impl Into<String>, changed: bool) -> Self {
        Self {
            text: text.into(),
            changed,
        }
    }
}

/// Stand-in for a collapsed run of unchanged rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HunkPlaceholder {
    /// `"<start_index>-<end_index>"`; stable while the rows are unchanged.
    pub id: String,
    pub start_index: usize,
    /// Exclusive.
    pub end_index: usize,
    pub count: usize,
}

impl HunkPlaceholder {
    pub fn new(start_index: usize, end_index: usize) -> Self {
        Self {
            id: format!("{start_index}-{end_index}"),
            start_index,
            end_index,
            count: end_index - start_index,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
}
