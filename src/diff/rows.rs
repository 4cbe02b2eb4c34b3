use crate::domain::{DiffRow, SourceText};
use similar::{DiffTag, TextDiff};

#[derive(Debug, Clone, Copy, PartialEq)]
enum SegmentTag {
    Unchanged,
    Removed,
    Added,
}

struct Segment<'a> {
    tag: SegmentTag,
    lines: &'a [&'a str],
}

/// Splits on `\n`, dropping the empty tail left by a final newline.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut lines: Vec<&str> = text.split('\n').collect();
    if text.ends_with('\n') {
        lines.pop();
    }
    lines
}

/// Builds the numbered row model for a before/after text pair.
pub fn build_rows(source: &SourceText) -> Vec<DiffRow> {
    let mut rows = build_diff_rows(&source.old_text, &source.new_text);
    assign_line_numbers(&mut rows);
    rows
}

/// Line-level diff of two texts as unnumbered side-by-side rows.
pub fn build_diff_rows(old_text: &str, new_text: &str) -> Vec<DiffRow> {
    let old_lines = split_lines(old_text);
    let new_lines = split_lines(new_text);
    if old_lines.is_empty() && new_lines.is_empty() {
        return Vec::new();
    }

    let diff = TextDiff::from_slices(&old_lines, &new_lines);

    let mut segments = Vec::new();
    for op in diff.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => segments.push(Segment {
                tag: SegmentTag::Unchanged,
                lines: &old_lines[old_range],
            }),
            DiffTag::Delete => segments.push(Segment {
                tag: SegmentTag::Removed,
                lines: &old_lines[old_range],
            }),
            DiffTag::Insert => segments.push(Segment {
                tag: SegmentTag::Added,
                lines: &new_lines[new_range],
            }),
            DiffTag::Replace => {
                segments.push(Segment {
                    tag: SegmentTag::Removed,
                    lines: &old_lines[old_range],
                });
                segments.push(Segment {
                    tag: SegmentTag::Added,
                    lines: &new_lines[new_range],
                });
            }
        }
    }

    rows_from_segments(&segments)
}

fn rows_from_segments(segments: &[Segment<'_>]) -> Vec<DiffRow> {
    let mut rows = Vec::new();
    let mut i = 0usize;

    while i < segments.len() {
        let segment = &segments[i];

        // Removed lines directly followed by added lines form a replacement block
        if segment.tag == SegmentTag::Removed
            && let Some(next) = segments.get(i + 1)
            && next.tag == SegmentTag::Added
        {
            let removed = segment.lines;
            let added = next.lines;
            let row_count = std::cmp::max(removed.len(), added.len());

            for k in 0..row_count {
                rows.push(DiffRow::modified(
                    removed.get(k).copied(),
                    added.get(k).copied(),
                ));
            }

            i += 2;
            continue;
        }

        for line in segment.lines {
            rows.push(match segment.tag {
                SegmentTag::Unchanged => DiffRow::context(line),
                SegmentTag::Added => DiffRow::added(line),
                SegmentTag::Removed => DiffRow::removed(line),
            });
        }
        i += 1;
    }

    rows
}

/// Numbers each side independently, skipping rows that lack that side.
pub fn assign_line_numbers(rows: &mut [DiffRow]) {
    let mut old_no = 1usize;
    let mut new_no = 1usize;

    for row in rows.iter_mut() {
        row.old_line_number = None;
        row.new_line_number = None;

        if row.has_left {
            row.old_line_number = Some(old_no);
            old_no += 1;
        }
        if row.has_right {
            row.new_line_number = Some(new_no);
            new_no += 1;
        }
    }
}
