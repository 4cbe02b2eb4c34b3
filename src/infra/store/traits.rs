use crate::domain::{ChangeRecord, ChangeStoreError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Source of recorded file changes for agent sessions.
#[async_trait]
pub trait ChangeStore: Send + Sync {
    async fn list_file_changes(
        &self,
        session_id: &str,
    ) -> Result<Vec<ChangeRecord>, ChangeStoreError>;

    async fn get_change_detail(
        &self,
        session_id: &str,
        change_id: &str,
    ) -> Result<ChangeRecord, ChangeStoreError>;

    /// Writes every stored diff of the session to `path`.
    async fn export_patch(&self, session_id: &str, path: &Path)
    -> Result<PathBuf, ChangeStoreError>;

    /// Writes the diff of one change to `path`.
    async fn export_single_change(
        &self,
        session_id: &str,
        change_id: &str,
        path: &Path,
    ) -> Result<PathBuf, ChangeStoreError>;
}
