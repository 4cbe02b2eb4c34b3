use crate::application::ChangeView;
use crate::diff::{DiffModelCache, WindowState};
use crate::domain::ChangeStoreError;
use crate::infra::app_config::{AppConfig, load_config};
use crate::infra::session::{AgentEventConverter, JsonlSessionStore};
use crate::infra::store::{ChangeStore, FileChangeStore};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct AppState {
    pub config: Arc<RwLock<AppConfig>>,
    pub changes: Arc<FileChangeStore>,
    pub sessions: Arc<JsonlSessionStore>,
    pub converter: AgentEventConverter,
    pub models: DiffModelCache,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            changes: Arc::new(FileChangeStore::from_config(&config)),
            sessions: Arc::new(JsonlSessionStore::from_config(&config)),
            converter: AgentEventConverter,
            models: DiffModelCache::with_capacity(config.model_cache_capacity),
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// State built from the config file, or defaults when there is none.
    pub fn load() -> Self {
        Self::new(load_config())
    }

    pub fn window_state(&self) -> WindowState {
        let config = self.config.read();
        WindowState::new(config.context_lines, config.show_full_file)
    }

    /// Opens a view for one change, replaying history when the record has no text.
    ///
    /// `project_path` defaults to the project the session was recorded in.
    pub async fn open_change(
        &self,
        session_id: &str,
        change_id: &str,
        project_path: Option<&str>,
    ) -> Result<ChangeView, ChangeStoreError> {
        let record = self.changes.get_change_detail(session_id, change_id).await?;
        let project_path = match project_path {
            Some(path) => Some(path.to_string()),
            None => self.changes.project_path(session_id)?,
        };

        let mut view = ChangeView::new(record, self.models.clone(), self.window_state());
        if let Some(path) = project_path {
            view = view.with_project_path(path);
        }
        if view.needs_history() {
            view.hydrate(self.sessions.as_ref(), &self.converter).await;
        }
        Ok(view)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::load()
    }
}
