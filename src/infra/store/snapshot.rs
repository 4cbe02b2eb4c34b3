//! File content snapshots taken around each prompt of a session.
//!
//! The agent runtime commits the working tree before and after a prompt and
//! writes the commit ids to `<data_dir>/git-records/<session>.json`. Those
//! commits let the change store recover content that was not captured when a
//! change was recorded.

use crate::infra::app_config::AppConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Commits bracketing one prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCommits {
    pub prompt_index: i32,
    pub commit_before: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_after: Option<String>,
}

/// All prompt commits of one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionCommits {
    pub session_id: String,
    #[serde(default)]
    pub records: Vec<PromptCommits>,
}

/// Source of file content as it was before or after a prompt.
pub trait SnapshotSource: Send + Sync {
    fn commits_for_prompt(&self, session_id: &str, prompt_index: i32) -> Option<PromptCommits>;

    fn file_at(&self, project_path: &str, commit: &str, file_path: &str) -> Option<String>;

    fn content_before(
        &self,
        session_id: &str,
        project_path: &str,
        prompt_index: i32,
        file_path: &str,
    ) -> Option<String> {
        let commits = self.commits_for_prompt(session_id, prompt_index)?;
        self.file_at(project_path, &commits.commit_before, file_path)
    }

    fn content_after(
        &self,
        session_id: &str,
        project_path: &str,
        prompt_index: i32,
        file_path: &str,
    ) -> Option<String> {
        let commits = self.commits_for_prompt(session_id, prompt_index)?;
        self.file_at(project_path, commits.commit_after.as_deref()?, file_path)
    }
}

/// Reads prompt commit records from disk and file content through `git show`.
#[derive(Debug, Clone)]
pub struct GitSnapshots {
    records_dir: PathBuf,
}

impl GitSnapshots {
    pub fn new(records_dir: impl Into<PathBuf>) -> Self {
        Self {
            records_dir: records_dir.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.git_records_dir())
    }

    fn records_path(&self, session_id: &str) -> PathBuf {
        self.records_dir.join(format!("{session_id}.json"))
    }

    pub fn load_session_commits(&self, session_id: &str) -> Option<SessionCommits> {
        let path = self.records_path(session_id);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(commits) => Some(commits),
            Err(err) => {
                log::warn!("Ignoring unreadable git records {}: {}", path.display(), err);
                None
            }
        }
    }
}

impl SnapshotSource for GitSnapshots {
    fn commits_for_prompt(&self, session_id: &str, prompt_index: i32) -> Option<PromptCommits> {
        self.load_session_commits(session_id)?
            .records
            .into_iter()
            .find(|r| r.prompt_index == prompt_index)
    }

    fn file_at(&self, project_path: &str, commit: &str, file_path: &str) -> Option<String> {
        git_show_file(Path::new(project_path), commit, file_path)
    }
}

/// Content of `file_path` at `commit`, or `None` when git cannot produce it.
pub fn git_show_file(repo_path: &Path, commit: &str, file_path: &str) -> Option<String> {
    if commit.is_empty() || file_path.is_empty() {
        return None;
    }

    let object = format!("{}:{}", commit, file_path.replace('\\', "/"));
    let output = Command::new("git")
        .args(["-C", &repo_path.to_string_lossy(), "show", &object])
        .output()
        .ok()?;

    if !output.status.success() {
        log::debug!(
            "git show {} failed: {}",
            object,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }
    String::from_utf8(output.stdout).ok()
}
