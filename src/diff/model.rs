//! Row model assembly and memoization keyed by the before/after text.

use super::{patch, rows, stats, words};
use crate::domain::{ChangeRecord, DiffRow, DiffStats, SourceText};
use crate::infra::hash::text_pair_key;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Where the text behind a diff model came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOrigin {
    /// Stored `old_content` / `new_content`.
    Record,
    /// Recovered from the stored unified diff.
    Patch,
    /// Recovered by replaying the session history.
    History,
}

/// Finished row model for one before/after pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffModel {
    pub rows: Vec<DiffRow>,
    /// Word spans per row, present only for modified rows with both sides.
    pub highlights: Vec<Option<words::RowHighlight>>,
    pub stats: DiffStats,
}

impl DiffModel {
    pub fn build(source: &SourceText) -> Self {
        let rows = rows::build_rows(source);
        let highlights = rows.iter().map(words::highlight_row).collect();
        let stats = stats::count_rows(&rows);
        Self {
            rows,
            highlights,
            stats,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Text for a record from the record itself, else from its unified diff.
///
/// `None` means neither is usable and the caller should try history replay.
pub fn resolve_source(record: &ChangeRecord) -> Option<(SourceText, TextOrigin)> {
    if record.has_text() {
        let source = record.source_text();
        if !rows::build_diff_rows(&source.old_text, &source.new_text).is_empty() {
            return Some((source, TextOrigin::Record));
        }
    }

    let diff = record.unified_diff.as_deref()?;
    let source = patch::extract_source_text(diff)?;
    Some((source, TextOrigin::Patch))
}

struct CachedModel {
    source: SourceText,
    model: Arc<DiffModel>,
}

/// LRU of built models keyed by content hashes; hits are verified against the text.
#[derive(Clone)]
pub struct DiffModelCache(Arc<Mutex<LruCache<(u64, u64), CachedModel>>>);

impl Default for DiffModelCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl DiffModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self(Arc::new(Mutex::new(LruCache::new(capacity))))
    }

    /// Returns the cached model for `source`, building it on a miss.
    pub fn get_or_build(&self, source: &SourceText) -> Arc<DiffModel> {
        let key = text_pair_key(&source.old_text, &source.new_text);

        if let Some(cached) = self.0.lock().get(&key)
            && cached.source == *source
        {
            return Arc::clone(&cached.model);
        }

        let model = Arc::new(DiffModel::build(source));
        self.0.lock().put(
            key,
            CachedModel {
                source: source.clone(),
                model: Arc::clone(&model),
            },
        );
        model
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
