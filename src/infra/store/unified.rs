//! Unified diff generation and line counting for stored change records.

use similar::TextDiff;
use unidiff::PatchSet;

const CONTEXT_RADIUS: usize = 3;

/// Unified diff for a change; `None` when both sides are absent or nothing changed.
pub fn generate_unified_diff(
    file_path: &str,
    old_content: Option<&str>,
    new_content: Option<&str>,
) -> Option<String> {
    let old_header = match old_content {
        Some(_) => format!("a/{file_path}"),
        None => "/dev/null".to_string(),
    };
    let new_header = match new_content {
        Some(_) => format!("b/{file_path}"),
        None => "/dev/null".to_string(),
    };
    if old_content.is_none() && new_content.is_none() {
        return None;
    }

    let old = old_content.unwrap_or_default();
    let new = new_content.unwrap_or_default();
    let diff = TextDiff::from_lines(old, new);
    let text = diff
        .unified_diff()
        .context_radius(CONTEXT_RADIUS)
        .header(&old_header, &new_header)
        .to_string();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Counts added/removed lines of a unified diff.
pub fn count_diff_lines(diff: &str) -> (i32, i32) {
    let trimmed = diff.trim();
    if trimmed.is_empty() {
        return (0, 0);
    }

    let mut patch = PatchSet::new();
    match patch.parse(trimmed) {
        Ok(()) => {
            let mut added = 0usize;
            let mut removed = 0usize;
            for file in patch.files() {
                added += file.added();
                removed += file.removed();
            }
            (added as i32, removed as i32)
        }
        Err(err) => {
            log::debug!("Counting diff lines by prefix after parse failure: {}", err);
            count_prefixed_lines(diff)
        }
    }
}

fn count_prefixed_lines(diff: &str) -> (i32, i32) {
    let mut added = 0;
    let mut removed = 0;

    for line in diff.lines() {
        if line.starts_with('+') && !line.starts_with("+++") {
            added += 1;
        } else if line.starts_with('-') && !line.starts_with("---") {
            removed += 1;
        }
    }

    (added, removed)
}
