//! Controller for viewing one recorded change.
//!
//! Owns a view-local copy of the record, resolves its text (record, then
//! unified diff, then history replay), and keeps the windowing state used
//! to render the rows. History replay runs at most once per record id and
//! its result is dropped if the view was unmounted in the meantime.

use crate::application::history;
use crate::diff::{
    DiffModel, DiffModelCache, TextOrigin, WindowItem, WindowState, compute_stats, resolve_source,
};
use crate::domain::{ChangeRecord, DiffStats};
use crate::infra::session::{EventConverter, SessionEventStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct ChangeView {
    record: ChangeRecord,
    project_path: Option<String>,
    history_attempted: bool,
    mounted: CancellationToken,
    window: WindowState,
    cache: DiffModelCache,
    resolved: Option<Resolved>,
}

struct Resolved {
    model: Arc<DiffModel>,
    origin: TextOrigin,
}

impl ChangeView {
    pub fn new(record: ChangeRecord, cache: DiffModelCache, window: WindowState) -> Self {
        let mut view = Self {
            record,
            project_path: None,
            history_attempted: false,
            mounted: CancellationToken::new(),
            window,
            cache,
            resolved: None,
        };
        view.resolve();
        view
    }

    pub fn with_project_path(mut self, project_path: impl Into<String>) -> Self {
        self.project_path = Some(project_path.into());
        self
    }

    /// The view-local record, including any text recovered from history.
    pub fn record(&self) -> &ChangeRecord {
        &self.record
    }

    /// Swaps in a fresh copy of a record. A new id resets the replay guard.
    pub fn replace_record(&mut self, record: ChangeRecord) {
        if record.id != self.record.id {
            self.history_attempted = false;
        }
        self.record = record;
        self.resolve();
    }

    pub fn model(&self) -> Option<&DiffModel> {
        self.resolved.as_ref().map(|r| r.model.as_ref())
    }

    pub fn origin(&self) -> Option<TextOrigin> {
        self.resolved.as_ref().map(|r| r.origin)
    }

    /// True when no text could be found and history replay was already tried.
    pub fn is_unavailable(&self) -> bool {
        self.resolved.is_none() && self.history_attempted
    }

    pub fn needs_history(&self) -> bool {
        self.resolved.is_none() && !self.history_attempted
    }

    pub fn stats(&self) -> DiffStats {
        let rows = self.model().map(|m| m.rows.as_slice()).unwrap_or_default();
        compute_stats(&self.record, rows)
    }

    pub fn window(&self) -> &WindowState {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut WindowState {
        &mut self.window
    }

    pub fn visible_items(&self) -> Vec<WindowItem> {
        match self.model() {
            Some(model) => self.window.visible_items(&model.rows),
            None => Vec::new(),
        }
    }

    /// Token cancelled when the view goes away; hand it to whoever tears the view down.
    pub fn mount_token(&self) -> CancellationToken {
        self.mounted.clone()
    }

    pub fn unmount(&self) {
        self.mounted.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.mounted.is_cancelled()
    }

    /// Replays the session when the record has no usable text.
    ///
    /// Returns true when recovered text was applied.
    pub async fn hydrate(
        &mut self,
        store: &dyn SessionEventStore,
        converter: &dyn EventConverter,
    ) -> bool {
        if !self.needs_history() || !self.is_mounted() {
            return false;
        }
        self.history_attempted = true;

        let candidate =
            history::reconstruct(&self.record, self.project_path.as_deref(), store, converter)
                .await;

        if !self.is_mounted() {
            log::debug!("Dropping history result for unmounted change {}", self.record.id);
            return false;
        }
        let Some(candidate) = candidate else {
            return false;
        };
        if !history::apply_candidate(&mut self.record, candidate) {
            return false;
        }

        self.resolve();
        if let Some(resolved) = self.resolved.as_mut() {
            resolved.origin = TextOrigin::History;
            true
        } else {
            false
        }
    }

    fn resolve(&mut self) {
        self.resolved = resolve_source(&self.record).map(|(source, origin)| {
            Resolved {
                model: self.cache.get_or_build(&source),
                origin,
            }
        });
    }
}

impl Drop for ChangeView {
    fn drop(&mut self) {
        self.mounted.cancel();
    }
}
