//! Domain error types for changelens.
//!
//! The diff core itself never fails; these errors cover the stores that
//! feed it and are surfaced to callers that explicitly ask for records,
//! session logs or exports.

use thiserror::Error;

/// Errors raised by change record storage.
#[derive(Debug, Error)]
pub enum ChangeStoreError {
    #[error("No change records for session: {0}")]
    SessionNotFound(String),

    #[error("Change not found: {0}")]
    ChangeNotFound(String),

    #[error("Change {0} has no diff content")]
    NoDiff(String),

    #[error("Change store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Change records are not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while loading a session event log.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Sessions directory does not exist: {0}")]
    MissingSessionsDir(String),

    #[error("Session file not found for ID {session_id} ({searched} logs searched)")]
    SessionNotFound { session_id: String, searched: usize },

    #[error("Session log I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
