use crate::domain::{ChangeRecord, DiffRow, DiffStats, RowKind};

/// Added/removed counts for a record and its row model.
///
/// When the record has no text but carries a unified diff with
/// backend-supplied counts, those counts are authoritative. Otherwise the
/// rows are counted.
pub fn compute_stats(record: &ChangeRecord, rows: &[DiffRow]) -> DiffStats {
    if let Some(stats) = backend_stats(record) {
        return stats;
    }
    count_rows(rows)
}

fn backend_stats(record: &ChangeRecord) -> Option<DiffStats> {
    if record.has_text() {
        return None;
    }
    record.unified_diff.as_deref().filter(|d| !d.trim().is_empty())?;
    let added = record.lines_added?;
    let removed = record.lines_removed?;
    Some(DiffStats {
        added: added.max(0) as usize,
        removed: removed.max(0) as usize,
    })
}

pub fn count_rows(rows: &[DiffRow]) -> DiffStats {
    let mut stats = DiffStats::default();
    for row in rows {
        match row.kind {
            RowKind::Added => stats.added += 1,
            RowKind::Removed => stats.removed += 1,
            RowKind::Modified => {
                if row.has_left {
                    stats.removed += 1;
                }
                if row.has_right {
                    stats.added += 1;
                }
            }
            RowKind::Context => {}
        }
    }
    stats
}
