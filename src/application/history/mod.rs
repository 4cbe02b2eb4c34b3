//! Recovers before/after text for a change by replaying its session log.
//!
//! Used only when a record carries neither text nor a usable unified diff.
//! The replay walks user prompts to find the turn that produced the change,
//! then picks the last file tool call in that turn that targets the file.

use crate::diff::extract_source_text;
use crate::domain::{ChangeRecord, MessageRole, NormalizedMessage, SourceText, ToolCall, is_blank};
use crate::infra::session::{EventConverter, SessionEventStore};
use crate::infra::store::file_store::looks_like_windows_path;
use serde_json::Value;


const PATH_KEYS: &[&str] = &["file_path", "path", "file", "filename"];
const PATCH_KEYS: &[&str] = &["patch", "diff", "raw_input"];

/// Replays the session of `record` and returns the recovered text, if any.
///
/// Fetch failures are logged and reported as `None`.
pub async fn reconstruct(
    record: &ChangeRecord,
    project_path: Option<&str>,
    store: &dyn SessionEventStore,
    converter: &dyn EventConverter,
) -> Option<SourceText> {
    let events = match store.load_session_history(&record.session_id).await {
        Ok(events) => events,
        Err(err) => {
            log::warn!(
                "History replay for change {} failed to load session {}: {}",
                record.id,
                record.session_id,
                err
            );
            return None;
        }
    };

    let messages: Vec<NormalizedMessage> =
        events.iter().filter_map(|event| converter.convert(event)).collect();
    let candidate = find_candidate(&messages, record, project_path);
    match &candidate {
        Some(_) => log::debug!("Recovered text for change {} from history", record.id),
        None => log::warn!(
            "No history candidate for change {} ({}, prompt {})",
            record.id,
            record.file_path,
            record.prompt_index
        ),
    }
    candidate
}

/// Last usable tool-call candidate for the record's file within its prompt.
pub fn find_candidate(
    messages: &[NormalizedMessage],
    record: &ChangeRecord,
    project_path: Option<&str>,
) -> Option<SourceText> {
    let matcher = PathMatcher::new(&record.file_path, project_path);

    // The first user message is prompt 0.
    let mut prompt_index: i32 = -1;
    let mut found = None;

    for message in messages {
        match message.role {
            MessageRole::User => prompt_index += 1,
            MessageRole::Assistant if prompt_index == record.prompt_index => {
                for call in message.tool_calls() {
                    let Some(path) = call.first_param(PATH_KEYS) else {
                        continue;
                    };
                    if !matcher.matches(path) {
                        continue;
                    }
                    if let Some(candidate) = candidate_from_call(call) {
                        found = Some(candidate);
                    }
                }
            }
            MessageRole::Assistant => {}
        }
    }

    found
}

/// Fills the blank sides of `record` from `candidate`. Returns whether
/// anything changed; non-blank text is never overwritten.
pub fn apply_candidate(record: &mut ChangeRecord, candidate: SourceText) -> bool {
    let mut changed = false;
    if is_blank(&record.old_content) && !candidate.old_text.is_empty() {
        record.old_content = Some(candidate.old_text);
        changed = true;
    }
    if is_blank(&record.new_content) && !candidate.new_text.is_empty() {
        record.new_content = Some(candidate.new_text);
        changed = true;
    }
    changed
}

fn candidate_from_call(call: &ToolCall) -> Option<SourceText> {
    let patched = || {
        call.first_param(PATCH_KEYS)
            .and_then(extract_source_text)
    };

    match call.name.to_ascii_lowercase().as_str() {
        "edit" => {
            let mut old_text = call.param("old_string").unwrap_or_default().to_string();
            let mut new_text = call.param("new_string").unwrap_or_default().to_string();
            if (old_text.trim().is_empty() || new_text.trim().is_empty())
                && let Some(patch) = patched()
            {
                if old_text.trim().is_empty() {
                    old_text = patch.old_text;
                }
                if new_text.trim().is_empty() {
                    new_text = patch.new_text;
                }
            }
            usable(SourceText::new(old_text, new_text))
        }
        "multiedit" => last_usable_edit(call).or_else(patched),
        "write" => match call.param("content") {
            Some(content) if !content.is_empty() => Some(SourceText::new("", content)),
            _ => patched().and_then(|patch| usable(SourceText::new("", patch.new_text))),
        },
        _ => patched(),
    }
}

fn last_usable_edit(call: &ToolCall) -> Option<SourceText> {
    let edits = call.input.get("edits").and_then(Value::as_array)?;
    edits.iter().rev().find_map(|edit| {
        let old_text = edit.get("old_string").and_then(Value::as_str).unwrap_or_default();
        let new_text = edit.get("new_string").and_then(Value::as_str).unwrap_or_default();
        if old_text.trim().is_empty() && new_text.trim().is_empty() {
            None
        } else {
            Some(SourceText::new(old_text, new_text))
        }
    })
}

fn usable(source: SourceText) -> Option<SourceText> {
    if source.old_text.trim().is_empty() && source.new_text.trim().is_empty() {
        None
    } else {
        Some(source)
    }
}

/// Matches tool-call paths against a record path.
///
/// Paths match on equality or when the candidate ends with `/<wanted>`.
/// Comparison ignores case only for drive-letter projects.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    wanted: String,
    case_insensitive: bool,
}

impl PathMatcher {
    pub fn new(file_path: &str, project_path: Option<&str>) -> Self {
        let case_insensitive = project_path.is_some_and(looks_like_windows_path);
        Self {
            wanted: normalize(file_path, case_insensitive),
            case_insensitive,
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        if self.wanted.is_empty() {
            return false;
        }
        let candidate = normalize(candidate, self.case_insensitive);
        candidate == self.wanted || candidate.ends_with(&format!("/{}", self.wanted))
    }
}

fn normalize(path: &str, case_insensitive: bool) -> String {
    let path = path.trim().replace('\\', "/");
    let path = path.trim_start_matches("./");
    if case_insensitive {
        path.to_ascii_lowercase()
    } else {
        path.to_string()
    }
}
