use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a recorded file change
pub type ChangeId = String;

/// Unique identifier for an agent session
pub type SessionId = String;

/// A single file change recorded while an agent session was running.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Unique identifier for the change.
    pub id: ChangeId,
    /// Session the change belongs to.
    pub session_id: SessionId,
    /// Index of the user prompt that produced the change.
    pub prompt_index: i32,
    /// Update timestamp in RFC3339 format.
    #[serde(default)]
    pub timestamp: String,
    /// Project-relative path of the changed file.
    pub file_path: String,
    pub change_type: ChangeType,
    pub source: ChangeSource,

    /// Content before the change (update/delete).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_content: Option<String>,
    /// Content after the change (create/update).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unified_diff: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines_added: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines_removed: Option<i32>,

    /// Tool that triggered the change, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChangeRecord {
    /// True when either side of the change carries non-blank text.
    pub fn has_text(&self) -> bool {
        !is_blank(&self.old_content) || !is_blank(&self.new_content)
    }

    /// Old/new text with absent sides normalized to the empty string.
    pub fn source_text(&self) -> SourceText {
        SourceText {
            old_text: self.old_content.clone().unwrap_or_default(),
            new_text: self.new_content.clone().unwrap_or_default(),
        }
    }
}

pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

/// Before/after text pair fed into the line diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourceText {
    pub old_text: String,
    pub new_text: String,
}

impl SourceText {
    pub fn new(old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self {
            old_text: old_text.into(),
            new_text: new_text.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.old_text.is_empty() && self.new_text.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Create,
    #[default]
    Update,
    Delete,
}

impl ChangeType {
    /// Derives the change type from which sides of the change exist.
    pub fn from_contents(old: &Option<String>, new: &Option<String>) -> Self {
        match (old, new) {
            (None, Some(_)) => Self::Create,
            (Some(_), None) => Self::Delete,
            _ => Self::Update,
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" | "add" | "added" => Ok(Self::Create),
            "update" | "modify" | "modified" => Ok(Self::Update),
            "delete" | "remove" | "removed" => Ok(Self::Delete),
            other => Err(format!("unknown change type: {other}")),
        }
    }
}

/// Where a change record came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
    /// A file tool call (edit, write, multiedit).
    #[default]
    Tool,
    /// A patch applied by the agent or detected afterwards.
    Patch,
}

impl fmt::Display for ChangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool => write!(f, "tool"),
            Self::Patch => write!(f, "patch"),
        }
    }
}

impl FromStr for ChangeSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tool" => Ok(Self::Tool),
            "patch" => Ok(Self::Patch),
            other => Err(format!("unknown change source: {other}")),
        }
    }
}
