//! End-to-end tests: stored records and session logs rendered through a change view

use changelens::application::ChangeView;
use changelens::diff::{
    DiffModel, DiffModelCache, TextOrigin, WindowItem, WindowState, extract_source_text,
};
use changelens::domain::{ChangeSource, ChangeType, RowKind, SourceText};
use changelens::infra::app_config::AppConfig;
use changelens::infra::session::{AgentEventConverter, JsonlSessionStore};
use changelens::infra::store::{ChangeStore, FileChangeStore, NewChange};
use changelens::state::AppState;
use std::fs;
use tempfile::TempDir;

fn state_in(dir: &TempDir) -> AppState {
    AppState::new(AppConfig {
        data_dir: Some(dir.path().join("data")),
        sessions_dir: Some(dir.path().join("sessions")),
        context_lines: 1,
        ..Default::default()
    })
}

fn write_session(dir: &TempDir, session_id: &str, events: &[serde_json::Value]) {
    let sessions = dir.path().join("sessions").join("2025").join("01");
    fs::create_dir_all(&sessions).unwrap();
    let mut lines = vec![
        serde_json::json!({"type": "session_meta", "payload": {"id": session_id}}).to_string(),
    ];
    lines.extend(events.iter().map(|e| e.to_string()));
    fs::write(sessions.join(format!("rollout-{session_id}.jsonl")), lines.join("\n")).unwrap();
}

#[test]
fn test_modified_line_scenario() {
    let model = DiffModel::build(&SourceText::new("a\nb\nc\n", "a\nx\nc\n"));
    let kinds: Vec<RowKind> = model.rows.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![RowKind::Context, RowKind::Modified, RowKind::Context]);
    assert_eq!(model.rows[1].old_line_number, Some(2));
    assert_eq!(model.rows[1].new_line_number, Some(2));
    assert_eq!((model.stats.added, model.stats.removed), (1, 1));
    assert!(model.highlights[1].is_some());
}

#[test]
fn test_created_file_scenario() {
    let model = DiffModel::build(&SourceText::new("", "hello\nworld\n"));
    assert_eq!(model.rows.len(), 2);
    assert!(model.rows.iter().all(|r| r.kind == RowKind::Added));
    assert!(model.rows.iter().all(|r| r.old_line_number.is_none()));
    assert_eq!(model.rows[1].new_line_number, Some(2));
    assert_eq!((model.stats.added, model.stats.removed), (2, 0));
}

#[test]
fn test_text_without_hunks_is_not_a_patch() {
    assert!(extract_source_text("just some notes\n+ not a hunk\n").is_none());
}

#[test]
fn test_context_window_scenario() {
    let old: String = (0..10).map(|n| format!("row {n}\n")).collect();
    let new = old.replace("row 5\n", "row five\n");
    let cache = DiffModelCache::new();
    let model = cache.get_or_build(&SourceText::new(old, new));

    let mut window = WindowState::new(1, false);
    let items = window.visible_items(&model.rows);
    let hunks: Vec<(String, usize)> = items
        .iter()
        .filter_map(|item| match item {
            WindowItem::Hunk(h) => Some((h.id.clone(), h.count)),
            WindowItem::Row(_) => None,
        })
        .collect();
    assert_eq!(hunks, vec![("0-4".to_string(), 4), ("7-10".to_string(), 3)]);

    window.expand("7-10");
    let expanded = window.visible_items(&model.rows);
    assert_eq!(expanded.len(), 1 + 3 + 3);
    assert!(matches!(expanded[0], WindowItem::Hunk(_)));
}

#[tokio::test]
async fn test_open_change_with_recorded_text() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let state = state_in(&dir);
    let id = state.changes.record_file_change(NewChange {
        session_id: "s1".into(),
        project_path: "/proj".into(),
        prompt_index: 0,
        file_path: "/proj/lib.rs".into(),
        change_type: ChangeType::Update,
        source: ChangeSource::Tool,
        old_content: Some("let a = 1;\n".into()),
        new_content: Some("let a = 2;\n".into()),
        ..Default::default()
    })?;

    let view = state.open_change("s1", &id, None).await?;
    assert_eq!(view.origin(), Some(TextOrigin::Record));
    assert_eq!(view.stats().added, 1);
    Ok(())
}

#[tokio::test]
async fn test_open_change_recovers_text_from_session_log() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let state = state_in(&dir);
    let id = state.changes.record_file_change(NewChange {
        session_id: "s2".into(),
        project_path: "/proj".into(),
        prompt_index: 1,
        file_path: "/proj/src/app.rs".into(),
        change_type: ChangeType::Update,
        source: ChangeSource::Tool,
        ..Default::default()
    })?;

    write_session(
        &dir,
        "s2",
        &[
            serde_json::json!({"type": "response_item", "payload": {
                "type": "message", "role": "user",
                "content": [{"type": "input_text", "text": "first prompt"}]
            }}),
            serde_json::json!({"type": "response_item", "payload": {
                "type": "message", "role": "user",
                "content": [{"type": "input_text", "text": "second prompt"}]
            }}),
            serde_json::json!({"type": "response_item", "payload": {
                "type": "function_call", "name": "MultiEdit",
                "arguments": serde_json::json!({
                    "file_path": "/proj/src/app.rs",
                    "edits": [
                        {"old_string": "start()", "new_string": "start(config)"},
                        {"old_string": "", "new_string": ""}
                    ]
                }).to_string()
            }}),
        ],
    );

    let view = state.open_change("s2", &id, None).await?;
    assert_eq!(view.origin(), Some(TextOrigin::History));
    assert_eq!(view.record().old_content.as_deref(), Some("start()"));
    assert_eq!(view.record().new_content.as_deref(), Some("start(config)"));

    let persisted = state.changes.get_change_detail("s2", &id).await?;
    assert!(persisted.old_content.is_none());
    Ok(())
}

#[tokio::test]
async fn test_missing_session_log_leaves_change_unavailable() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = FileChangeStore::new(dir.path().join("records"));
    let id = store.record_file_change(NewChange {
        session_id: "s3".into(),
        project_path: "/proj".into(),
        file_path: "gone.txt".into(),
        ..Default::default()
    })?;
    let record = store.get_change_detail("s3", &id).await?;

    let sessions = JsonlSessionStore::new(dir.path().join("no-sessions"));
    let mut view = ChangeView::new(record, DiffModelCache::new(), WindowState::default());
    assert!(!view.hydrate(&sessions, &AgentEventConverter).await);
    assert!(view.is_unavailable());
    assert_eq!(view.stats().added, 0);
    Ok(())
}
