use crate::domain::{DiffRow, RowKind, WordSpan};
use similar::{ChangeTag, TextDiff};

/// Word-level spans for both sides of a modified row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHighlight {
    pub left_spans: Vec<WordSpan>,
    pub right_spans: Vec<WordSpan>,
}

/// Word spans for a modified row with both sides present; `None` otherwise.
pub fn highlight_row(row: &DiffRow) -> Option<RowHighlight> {
    if row.kind != RowKind::Modified || !row.has_left || !row.has_right {
        return None;
    }
    let (left_spans, right_spans) = compute_word_diff(&row.left, &row.right);
    Some(RowHighlight {
        left_spans,
        right_spans,
    })
}

fn compute_word_diff(old: &str, new: &str) -> (Vec<WordSpan>, Vec<WordSpan>) {
    let diff = TextDiff::from_words(old, new);
    let mut left_spans = Vec::new();
    let mut right_spans = Vec::new();

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Delete => push_span(&mut left_spans, change.value(), true),
            ChangeTag::Insert => push_span(&mut right_spans, change.value(), true),
            ChangeTag::Equal => {
                push_span(&mut left_spans, change.value(), false);
                push_span(&mut right_spans, change.value(), false);
            }
        }
    }
    (left_spans, right_spans)
}

// Adjacent tokens with the same flag are merged into one span.
fn push_span(spans: &mut Vec<WordSpan>, text: &str, changed: bool) {
    if let Some(last) = spans.last_mut()
        && last.changed == changed
    {
        last.text.push_str(text);
        return;
    }
    spans.push(WordSpan::new(text, changed));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(spans: &[WordSpan]) -> String {
        spans.iter().map(|s| s.text.as_str()).collect()
    }

    fn changed_text(spans: &[WordSpan]) -> Vec<&str> {
        spans
            .iter()
            .filter(|s| s.changed)
            .map(|s| s.text.as_str())
            .collect()
    }

    #[test]
    fn highlights_only_the_changed_word() {
        let row = DiffRow::modified(Some("let count = 1;"), Some("let total = 1;"));
        let highlight = highlight_row(&row).unwrap();

        assert_eq!(joined(&highlight.left_spans), "let count = 1;");
        assert_eq!(joined(&highlight.right_spans), "let total = 1;");
        assert_eq!(changed_text(&highlight.left_spans), vec!["count"]);
        assert_eq!(changed_text(&highlight.right_spans), vec!["total"]);
    }

    #[test]
    fn padded_modified_rows_are_not_highlighted() {
        let row = DiffRow::modified(None, Some("extra line"));
        assert!(highlight_row(&row).is_none());
    }

    #[test]
    fn other_row_kinds_pass_through() {
        assert!(highlight_row(&DiffRow::context("same")).is_none());
        assert!(highlight_row(&DiffRow::added("new")).is_none());
        assert!(highlight_row(&DiffRow::removed("old")).is_none());
    }

    #[test]
    fn sides_never_carry_the_other_sides_tokens() {
        let row = DiffRow::modified(Some("alpha beta"), Some("alpha gamma delta"));
        let highlight = highlight_row(&row).unwrap();

        assert!(!joined(&highlight.left_spans).contains("gamma"));
        assert!(!joined(&highlight.right_spans).contains("beta"));
        assert!(highlight.left_spans.iter().any(|s| !s.changed && s.text.contains("alpha")));
    }
}
