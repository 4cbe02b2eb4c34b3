//! JSON-file backed change records, one document per session.

use super::snapshot::{GitSnapshots, SnapshotSource};
use super::traits::ChangeStore;
use super::unified::{count_diff_lines, generate_unified_diff};
use crate::domain::{
    ChangeId, ChangeRecord, ChangeSource, ChangeStoreError, ChangeType, is_blank,
};
use crate::infra::app_config::AppConfig;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// All changes recorded for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionChanges {
    pub session_id: String,
    pub project_path: String,
    pub created_at: String,
    pub updated_at: String,
    pub changes: Vec<ChangeRecord>,
}

impl SessionChanges {
    pub fn new(session_id: &str, project_path: &str) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            session_id: session_id.to_string(),
            project_path: project_path.to_string(),
            created_at: now.clone(),
            updated_at: now,
            changes: Vec::new(),
        }
    }
}

/// A file change reported by the agent runtime.
#[derive(Debug, Clone, Default)]
pub struct NewChange {
    pub session_id: String,
    pub project_path: String,
    pub prompt_index: i32,
    pub file_path: String,
    pub change_type: ChangeType,
    pub source: ChangeSource,
    pub old_content: Option<String>,
    pub new_content: Option<String>,
    pub tool_name: Option<String>,
    pub tool_call_id: Option<String>,
}

impl From<ChangeRecord> for NewChange {
    fn from(record: ChangeRecord) -> Self {
        Self {
            session_id: record.session_id,
            project_path: String::new(),
            prompt_index: record.prompt_index,
            file_path: record.file_path,
            change_type: record.change_type,
            source: record.source,
            old_content: record.old_content,
            new_content: record.new_content,
            tool_name: record.tool_name,
            tool_call_id: record.tool_call_id,
        }
    }
}

pub struct FileChangeStore {
    records_dir: PathBuf,
    sessions: Mutex<HashMap<String, SessionChanges>>,
    snapshots: Option<Arc<dyn SnapshotSource>>,
}

impl FileChangeStore {
    pub fn new(records_dir: impl Into<PathBuf>) -> Self {
        Self {
            records_dir: records_dir.into(),
            sessions: Mutex::new(HashMap::new()),
            snapshots: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.change_records_dir())
            .with_snapshots(Arc::new(GitSnapshots::from_config(config)))
    }

    /// Source used to backfill missing content when records are read from disk.
    pub fn with_snapshots(mut self, snapshots: Arc<dyn SnapshotSource>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    fn records_path(&self, session_id: &str) -> PathBuf {
        self.records_dir.join(format!("{session_id}.json"))
    }

    fn load_session(&self, session_id: &str) -> Result<Option<SessionChanges>, ChangeStoreError> {
        let mut sessions = self.sessions.lock();
        self.ensure_loaded(&mut sessions, session_id)?;
        Ok(sessions.get(session_id).cloned())
    }

    /// Reads the session file into the cache unless it is already there.
    fn ensure_loaded(
        &self,
        sessions: &mut HashMap<String, SessionChanges>,
        session_id: &str,
    ) -> Result<(), ChangeStoreError> {
        if sessions.contains_key(session_id) {
            return Ok(());
        }

        let path = self.records_path(session_id);
        if !path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(&path)?;
        let mut records: SessionChanges = serde_json::from_str(&content)?;
        if self.upgrade_records(&mut records) {
            log::info!("Upgraded stored change records for session {}", session_id);
            if let Err(err) = self.persist(&records) {
                log::warn!("Failed to save upgraded records for {}: {}", session_id, err);
            }
        }
        log::info!(
            "Loaded {} change records for session {}",
            records.changes.len(),
            session_id
        );
        sessions.insert(session_id.to_string(), records);
        Ok(())
    }

    /// Normalizes paths, merges duplicate records and backfills missing
    /// content of records read from disk. Returns true when anything changed.
    fn upgrade_records(&self, records: &mut SessionChanges) -> bool {
        let mut mutated = false;

        for change in &mut records.changes {
            let normalized = normalize_record_path(&records.project_path, &change.file_path);
            if change.file_path != normalized {
                change.file_path = normalized;
                mutated = true;
            }
        }

        let mut index: HashMap<(i32, ChangeSource, String), usize> = HashMap::new();
        let mut merged: Vec<ChangeRecord> = Vec::with_capacity(records.changes.len());
        for change in std::mem::take(&mut records.changes) {
            let key = (change.prompt_index, change.source, change.file_path.clone());
            if let Some(&idx) = index.get(&key) {
                let timestamp = change.timestamp.clone();
                merge_into(&mut merged[idx], &NewChange::from(change));
                merged[idx].timestamp = timestamp;
                mutated = true;
            } else {
                index.insert(key, merged.len());
                merged.push(change);
            }
        }
        records.changes = merged;

        let snapshots = self.snapshots.as_deref();
        for change in &mut records.changes {
            if backfill_content(change, &records.session_id, &records.project_path, snapshots) {
                mutated = true;
            }
        }

        if mutated {
            records.updated_at = Utc::now().to_rfc3339();
        }
        mutated
    }

    fn persist(&self, records: &SessionChanges) -> Result<(), ChangeStoreError> {
        fs::create_dir_all(&self.records_dir)?;
        let path = self.records_path(&records.session_id);
        let content = serde_json::to_string_pretty(records)?;
        fs::write(&path, content)?;
        log::debug!("Saved change records to {}", path.display());
        Ok(())
    }

    /// Records a change, merging it into an earlier record for the same
    /// prompt, file and source when one exists. Returns the record id.
    pub fn record_file_change(&self, change: NewChange) -> Result<ChangeId, ChangeStoreError> {
        let mut sessions = self.sessions.lock();
        self.ensure_loaded(&mut sessions, &change.session_id)?;
        let records = sessions
            .entry(change.session_id.clone())
            .or_insert_with(|| SessionChanges::new(&change.session_id, &change.project_path));

        let file_path = normalize_record_path(&records.project_path, &change.file_path);
        let now = Utc::now().to_rfc3339();

        let existing = records.changes.iter_mut().rev().find(|c| {
            c.prompt_index == change.prompt_index
                && c.file_path == file_path
                && c.source == change.source
        });

        let id = if let Some(existing) = existing {
            merge_into(existing, &change);
            existing.timestamp = now.clone();
            log::info!("Merged file change {} into {}", file_path, existing.id);
            existing.id.clone()
        } else {
            let id = format!("change_{}_{}", change.session_id, records.changes.len());
            let mut record = ChangeRecord {
                id: id.clone(),
                session_id: change.session_id.clone(),
                prompt_index: change.prompt_index,
                timestamp: now.clone(),
                file_path: file_path.clone(),
                change_type: change.change_type,
                source: change.source,
                old_content: change.old_content.clone(),
                new_content: without_deleted_content(&change),
                tool_name: change.tool_name.clone(),
                tool_call_id: change.tool_call_id.clone(),
                ..Default::default()
            };
            refresh_derived_fields(&mut record, change.change_type);
            records.changes.push(record);
            log::info!("Recorded file change {} ({})", file_path, id);
            id
        };

        records.updated_at = now;
        self.persist(records)?;
        Ok(id)
    }

    /// Project root the session's paths are relative to.
    pub fn project_path(&self, session_id: &str) -> Result<Option<String>, ChangeStoreError> {
        Ok(self
            .load_session(session_id)?
            .map(|records| records.project_path)
            .filter(|path| !path.is_empty()))
    }

    /// Concatenation of every stored diff of the session.
    pub fn session_patch(&self, session_id: &str) -> Result<String, ChangeStoreError> {
        let records = self
            .load_session(session_id)?
            .ok_or_else(|| ChangeStoreError::SessionNotFound(session_id.to_string()))?;

        let mut patch = String::new();
        for diff in records.changes.iter().filter_map(|c| c.unified_diff.as_deref()) {
            patch.push_str(diff);
            patch.push('\n');
        }
        Ok(patch)
    }

    pub fn single_change_patch(
        &self,
        session_id: &str,
        change_id: &str,
    ) -> Result<String, ChangeStoreError> {
        let records = self
            .load_session(session_id)?
            .ok_or_else(|| ChangeStoreError::SessionNotFound(session_id.to_string()))?;

        let change = records
            .changes
            .iter()
            .find(|c| c.id == change_id)
            .ok_or_else(|| ChangeStoreError::ChangeNotFound(change_id.to_string()))?;

        change
            .unified_diff
            .clone()
            .ok_or_else(|| ChangeStoreError::NoDiff(change_id.to_string()))
    }

    /// Drops the session from memory and deletes its file.
    pub fn clear_change_records(&self, session_id: &str) -> Result<(), ChangeStoreError> {
        self.sessions.lock().remove(session_id);

        let path = self.records_path(session_id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        log::info!("Cleared change records for session {}", session_id);
        Ok(())
    }
}

#[async_trait]
impl ChangeStore for FileChangeStore {
    async fn list_file_changes(
        &self,
        session_id: &str,
    ) -> Result<Vec<ChangeRecord>, ChangeStoreError> {
        Ok(self
            .load_session(session_id)?
            .map(|records| records.changes)
            .unwrap_or_default())
    }

    async fn get_change_detail(
        &self,
        session_id: &str,
        change_id: &str,
    ) -> Result<ChangeRecord, ChangeStoreError> {
        self.list_file_changes(session_id)
            .await?
            .into_iter()
            .find(|c| c.id == change_id)
            .ok_or_else(|| ChangeStoreError::ChangeNotFound(change_id.to_string()))
    }

    async fn export_patch(
        &self,
        session_id: &str,
        path: &Path,
    ) -> Result<PathBuf, ChangeStoreError> {
        let patch = self.session_patch(session_id)?;
        fs::write(path, patch)?;
        log::info!("Exported session patch to {}", path.display());
        Ok(path.to_path_buf())
    }

    async fn export_single_change(
        &self,
        session_id: &str,
        change_id: &str,
        path: &Path,
    ) -> Result<PathBuf, ChangeStoreError> {
        let patch = self.single_change_patch(session_id, change_id)?;
        fs::write(path, patch)?;
        log::info!("Exported change {} to {}", change_id, path.display());
        Ok(path.to_path_buf())
    }
}

fn without_deleted_content(change: &NewChange) -> Option<String> {
    if change.change_type == ChangeType::Delete {
        None
    } else {
        change.new_content.clone()
    }
}

// Keeps the earliest old content and the latest non-blank new content; a later delete wins.
fn merge_into(existing: &mut ChangeRecord, change: &NewChange) {
    let created = existing.change_type == ChangeType::Create && existing.old_content.is_none();
    if !created && is_blank(&existing.old_content) && !is_blank(&change.old_content) {
        existing.old_content = change.old_content.clone();
    }

    if change.change_type == ChangeType::Delete {
        if created {
            // Created then deleted within one prompt: show the created content as removed.
            existing.old_content = existing.new_content.clone();
        }
        existing.new_content = None;
    } else if !is_blank(&change.new_content) {
        existing.new_content = change.new_content.clone();
    }

    if change.tool_name.is_some() {
        existing.tool_name = change.tool_name.clone();
    }
    if change.tool_call_id.is_some() {
        existing.tool_call_id = change.tool_call_id.clone();
    }

    refresh_derived_fields(existing, change.change_type);
}

/// Fills blank sides from the prompt's snapshots, then from the file on disk
/// for the new side, and recomputes the derived fields. Returns true on change.
fn backfill_content(
    change: &mut ChangeRecord,
    session_id: &str,
    project_path: &str,
    snapshots: Option<&dyn SnapshotSource>,
) -> bool {
    let original = change.clone();
    let prompt_index = change.prompt_index;

    if is_blank(&change.old_content)
        && let Some(old) = snapshots.and_then(|s| {
            s.content_before(session_id, project_path, prompt_index, &change.file_path)
        })
    {
        change.old_content = Some(old);
    }

    if change.change_type == ChangeType::Delete {
        change.new_content = None;
    } else if is_blank(&change.new_content) {
        let file_path = change.file_path.as_str();
        let new = snapshots
            .and_then(|s| s.content_after(session_id, project_path, prompt_index, file_path))
            .or_else(|| {
                resolve_full_path(project_path, file_path)
                    .and_then(|path| fs::read_to_string(path).ok())
            });
        if let Some(new) = new {
            change.new_content = Some(new);
        }
    }

    let fallback_type = change.change_type;
    refresh_derived_fields(change, fallback_type);
    *change != original
}

/// Absolute path of a stored record path; `None` when it cannot be anchored.
fn resolve_full_path(project_path: &str, file_path: &str) -> Option<PathBuf> {
    let path = Path::new(file_path);
    if file_path.is_empty() {
        None
    } else if path.is_absolute() {
        Some(path.to_path_buf())
    } else if project_path.is_empty() {
        None
    } else {
        Some(Path::new(project_path).join(path))
    }
}

fn refresh_derived_fields(record: &mut ChangeRecord, fallback_type: ChangeType) {
    record.change_type = match (&record.old_content, &record.new_content) {
        (None, None) => fallback_type,
        (old, new) => ChangeType::from_contents(old, new),
    };

    record.unified_diff = generate_unified_diff(
        &record.file_path,
        record.old_content.as_deref(),
        record.new_content.as_deref(),
    );
    let (added, removed) = match &record.unified_diff {
        Some(diff) => count_diff_lines(diff),
        None if record.old_content.is_none() && record.new_content.is_none() => {
            record.lines_added = None;
            record.lines_removed = None;
            return;
        }
        None => (0, 0),
    };
    record.lines_added = Some(added);
    record.lines_removed = Some(removed);
}

/// Project-relative, slash-separated path without a leading `./`.
pub fn normalize_record_path(project_path: &str, file_path: &str) -> String {
    let project = project_path.replace('\\', "/");
    let project = project.trim_end_matches('/');
    let full = file_path.replace('\\', "/");

    let case_insensitive = looks_like_windows_path(project);
    let (project_cmp, full_cmp) = if case_insensitive {
        (project.to_ascii_lowercase(), full.to_ascii_lowercase())
    } else {
        (project.to_string(), full.clone())
    };

    if !project_cmp.is_empty() {
        if full_cmp == project_cmp {
            return String::new();
        }
        if full_cmp.starts_with(&format!("{project_cmp}/")) {
            return full[project.len() + 1..]
                .trim_start_matches("./")
                .to_string();
        }
    }

    full.trim_start_matches("./").to_string()
}

/// `C:\...` or `C:/...`
pub fn looks_like_windows_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
