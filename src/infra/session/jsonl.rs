//! Session logs stored as one JSON event per line.

use super::traits::SessionEventStore;
use crate::domain::SessionStoreError;
use crate::infra::app_config::AppConfig;
use async_trait::async_trait;
use ignore::WalkBuilder;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

pub struct JsonlSessionStore {
    sessions_dir: PathBuf,
}

impl JsonlSessionStore {
    pub fn new(sessions_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.sessions_dir())
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    /// Finds the log whose leading `session_meta` event carries `session_id`.
    pub fn find_session_file(&self, session_id: &str) -> Result<PathBuf, SessionStoreError> {
        if !self.sessions_dir.is_dir() {
            return Err(SessionStoreError::MissingSessionsDir(
                self.sessions_dir.display().to_string(),
            ));
        }

        let walker = WalkBuilder::new(&self.sessions_dir)
            .hidden(false)
            .git_ignore(false)
            .git_exclude(false)
            .git_global(false)
            .build();

        let mut searched = 0;
        for entry in walker.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("jsonl") {
                continue;
            }
            searched += 1;
            log::debug!("Checking session log {}", path.display());

            if session_meta_id(path).as_deref() == Some(session_id) {
                log::info!("Found session log {}", path.display());
                return Ok(path.to_path_buf());
            }
        }

        log::warn!(
            "Session {} not found in {} ({} logs searched)",
            session_id,
            self.sessions_dir.display(),
            searched
        );
        Err(SessionStoreError::SessionNotFound {
            session_id: session_id.to_string(),
            searched,
        })
    }
}

#[async_trait]
impl SessionEventStore for JsonlSessionStore {
    async fn load_session_history(
        &self,
        session_id: &str,
    ) -> Result<Vec<Value>, SessionStoreError> {
        let path = self.find_session_file(session_id)?;
        let reader = BufReader::new(File::open(&path)?);

        let mut events = Vec::new();
        let mut skipped = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&line) {
                Ok(event) => events.push(event),
                Err(err) => {
                    skipped += 1;
                    log::warn!(
                        "Skipping malformed line {} in session {}: {}",
                        index + 1,
                        session_id,
                        err
                    );
                }
            }
        }

        log::info!(
            "Loaded {} events from session {} ({} malformed lines skipped)",
            events.len(),
            session_id,
            skipped
        );
        Ok(events)
    }
}

fn session_meta_id(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let first_line = BufReader::new(file).lines().next()?.ok()?;
    let meta: Value = match serde_json::from_str(&first_line) {
        Ok(meta) => meta,
        Err(err) => {
            log::debug!("Unreadable first line in {}: {}", path.display(), err);
            return None;
        }
    };
    if meta["type"].as_str() != Some("session_meta") {
        return None;
    }
    meta["payload"]["id"].as_str().map(str::to_string)
}
