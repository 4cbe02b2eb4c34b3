//! Best-effort recovery of before/after text from a unified diff.

use crate::domain::SourceText;

/// Rebuilds old/new text from the hunks of a unified diff.
///
/// Old text is context plus removed lines, new text is context plus added
/// lines, in order. Returns `None` when the text has no `@@` hunk or when
/// both sides come out empty.
pub fn extract_source_text(patch: &str) -> Option<SourceText> {
    let lines: Vec<&str> = patch.lines().collect();
    let mut old_text = String::new();
    let mut new_text = String::new();
    let mut saw_hunk = false;

    let mut i = 0usize;
    while i < lines.len() {
        if !lines[i].starts_with("@@") {
            i += 1;
            continue;
        }
        saw_hunk = true;
        i = read_hunk(&lines, i, &mut old_text, &mut new_text);
    }

    if !saw_hunk || (old_text.is_empty() && new_text.is_empty()) {
        return None;
    }
    Some(SourceText { old_text, new_text })
}

/// Consumes one hunk starting at its header; returns the index after the body.
fn read_hunk(
    lines: &[&str],
    header_idx: usize,
    old_text: &mut String,
    new_text: &mut String,
) -> usize {
    // With parsed counts the body is bounded exactly; otherwise run until the next header.
    let mut remaining =
        parse_hunk_header(lines[header_idx]).map(|(_, old_len, _, new_len)| (old_len, new_len));
    let mut idx = header_idx + 1;

    while idx < lines.len() {
        if let Some((old_left, new_left)) = remaining
            && old_left == 0
            && new_left == 0
        {
            break;
        }

        let line = lines[idx];
        if remaining.is_none() && is_header_line(line) {
            break;
        }
        if line.starts_with("@@") || line.starts_with("diff --git ") {
            break;
        }

        if line.starts_with('\\') {
            // "\ No newline at end of file"
            idx += 1;
            continue;
        }

        if let Some(text) = line.strip_prefix('+') {
            push_line(new_text, text);
            consume(&mut remaining, false, true);
        } else if let Some(text) = line.strip_prefix('-') {
            push_line(old_text, text);
            consume(&mut remaining, true, false);
        } else if remaining.is_none() && !line.is_empty() && !line.starts_with(' ') {
            // Without counts, an unprefixed line ends the hunk (e.g. `*** End Patch`).
            break;
        } else {
            // Context lines; some tools drop the leading space on blank context.
            let text = line.strip_prefix(' ').unwrap_or(line);
            push_line(old_text, text);
            push_line(new_text, text);
            consume(&mut remaining, true, true);
        }
        idx += 1;
    }

    idx
}

fn consume(remaining: &mut Option<(u32, u32)>, old: bool, new: bool) {
    if let Some((old_left, new_left)) = remaining {
        if old {
            *old_left = old_left.saturating_sub(1);
        }
        if new {
            *new_left = new_left.saturating_sub(1);
        }
    }
}

fn push_line(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('\n');
}

fn is_header_line(line: &str) -> bool {
    line.starts_with("diff --git ")
        || line.starts_with("--- ")
        || line.starts_with("+++ ")
        || line.starts_with("index ")
}

/// Parses `@@ -old_start,old_len +new_start,new_len @@`; a missing length means 1.
pub fn parse_hunk_header(header: &str) -> Option<(u32, u32, u32, u32)> {
    if !header.starts_with("@@") {
        return None;
    }

    let rest = header.trim_start_matches('@');
    let (meta, _) = rest.split_once("@@")?;
    let mut old = None;
    let mut new = None;

    for part in meta.split_whitespace() {
        if let Some(stripped) = part.strip_prefix('-') {
            old = parse_range(stripped);
        } else if let Some(stripped) = part.strip_prefix('+') {
            new = parse_range(stripped);
        }
    }

    let (old_start, old_len) = old?;
    let (new_start, new_len) = new?;
    Some((old_start, old_len, new_start, new_len))
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    let mut parts = range.split(',');
    let start = parts.next()?.parse().ok()?;
    let len = match parts.next() {
        Some(len) => len.parse().ok()?,
        None => 1,
    };
    Some((start, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_hunk_header_is_rejected() {
        assert!(extract_source_text("just some text\n+not a patch\n").is_none());
        assert!(extract_source_text("").is_none());
    }

    #[test]
    fn extracts_both_sides_of_a_hunk() {
        let patch = "--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1,3 +1,3 @@\n a\n-b\n+x\n c\n";
        let source = extract_source_text(patch).unwrap();
        assert_eq!(source.old_text, "a\nb\nc\n");
        assert_eq!(source.new_text, "a\nx\nc\n");
    }

    #[test]
    fn removed_lines_that_look_like_headers_stay_in_the_body() {
        let patch = "@@ -1,2 +1,1 @@\n--- separator\n+++ banner\n-x\n";
        let source = extract_source_text(patch).unwrap();
        assert_eq!(source.old_text, "-- separator\nx\n");
        assert_eq!(source.new_text, "++ banner\n");
    }

    #[test]
    fn concatenates_multiple_hunks_in_order() {
        let patch = "\
diff --git a/f.txt b/f.txt
--- a/f.txt
+++ b/f.txt
@@ -1,2 +1,2 @@
-one
+ONE
 two
@@ -10,2 +10,3 @@
 ten
+ten and a half
 eleven
";
        let source = extract_source_text(patch).unwrap();
        assert_eq!(source.old_text, "one\ntwo\nten\neleven\n");
        assert_eq!(source.new_text, "ONE\ntwo\nten\nten and a half\neleven\n");
    }

    #[test]
    fn creation_patch_has_empty_old_text() {
        let patch = "--- /dev/null\n+++ b/new.rs\n@@ -0,0 +1,2 @@\n+fn a() {}\n+fn b() {}\n";
        let source = extract_source_text(patch).unwrap();
        assert!(source.old_text.is_empty());
        assert_eq!(source.new_text, "fn a() {}\nfn b() {}\n");
    }

    #[test]
    fn hunk_headers_without_body_are_not_usable() {
        assert!(extract_source_text("@@ -1,0 +1,0 @@\n").is_none());
    }

    #[test]
    fn skips_no_newline_markers() {
        let patch = "@@ -1 +1 @@\n-old\n\\ No newline at end of file\n+new\n\\ No newline\n";
        let source = extract_source_text(patch).unwrap();
        assert_eq!(source.old_text, "old\n");
        assert_eq!(source.new_text, "new\n");
    }

    #[test]
    fn unparseable_header_falls_back_to_next_file_boundary() {
        let patch = "@@ changed @@\n keep\n-gone\n+here\ndiff --git a/x b/x\n--- a/x\n";
        let source = extract_source_text(patch).unwrap();
        assert_eq!(source.old_text, "keep\ngone\n");
        assert_eq!(source.new_text, "keep\nhere\n");
    }

    #[test]
    fn bare_header_stops_at_patch_trailer() {
        let patch = "*** Begin Patch\n*** Update File: a.rs\n@@\n-old\n keep\n\n+new\n\
                     *** End Patch\n";
        let source = extract_source_text(patch).unwrap();
        assert_eq!(source.old_text, "old\nkeep\n\n");
        assert_eq!(source.new_text, "keep\n\nnew\n");
    }

    #[test]
    fn parses_hunk_header_ranges() {
        assert_eq!(
            parse_hunk_header("@@ -10,2 +10,3 @@ fn x()"),
            Some((10, 2, 10, 3))
        );
        assert_eq!(parse_hunk_header("@@ -1 +1 @@"), Some((1, 1, 1, 1)));
        assert_eq!(parse_hunk_header("@@ nothing @@"), None);
        assert_eq!(parse_hunk_header("diff"), None);
    }
}
