//! Integration tests for the file-backed change store
//! These tests record changes, read them back through the async trait and export patches

use changelens::domain::{ChangeSource, ChangeStoreError, ChangeType};
use changelens::infra::store::{ChangeStore, FileChangeStore, NewChange};
use tempfile::TempDir;

fn new_change(prompt_index: i32, path: &str, old: Option<&str>, new: Option<&str>) -> NewChange {
    NewChange {
        session_id: "sess".into(),
        project_path: "/work/app".into(),
        prompt_index,
        file_path: path.into(),
        change_type: ChangeType::from_contents(
            &old.map(str::to_string),
            &new.map(str::to_string),
        ),
        source: ChangeSource::Tool,
        old_content: old.map(str::to_string),
        new_content: new.map(str::to_string),
        tool_name: Some("edit".into()),
        tool_call_id: None,
    }
}

#[tokio::test]
async fn test_record_list_and_detail() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = FileChangeStore::new(dir.path());

    let first = store.record_file_change(new_change(
        0,
        "/work/app/src/main.rs",
        Some("fn main() {}\n"),
        Some("fn main() {\n    run();\n}\n"),
    ))?;
    let second = store.record_file_change(new_change(0, "README.md", None, Some("# App\n")))?;

    let changes = store.list_file_changes("sess").await?;
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].file_path, "src/main.rs");
    assert_eq!(changes[1].change_type, ChangeType::Create);

    let detail = store.get_change_detail("sess", &second).await?;
    assert_eq!(detail.lines_added, Some(1));
    assert_eq!(detail.lines_removed, Some(0));
    assert!(detail.unified_diff.unwrap().contains("--- /dev/null"));

    let detail = store.get_change_detail("sess", &first).await?;
    assert_eq!(detail.tool_name.as_deref(), Some("edit"));
    assert!(!detail.timestamp.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unknown_ids() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = FileChangeStore::new(dir.path());

    assert!(store.list_file_changes("nobody").await?.is_empty());
    assert!(matches!(
        store.get_change_detail("nobody", "change_nobody_0").await,
        Err(ChangeStoreError::ChangeNotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_export_session_and_single_change() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = FileChangeStore::new(dir.path().join("records"));

    let a = store.record_file_change(new_change(0, "a.txt", Some("1\n"), Some("2\n")))?;
    store.record_file_change(new_change(1, "b.txt", Some("x\n"), Some("y\n")))?;

    let all_path = dir.path().join("session.patch");
    let written = store.export_patch("sess", &all_path).await?;
    assert_eq!(written, all_path);
    let all = std::fs::read_to_string(&all_path)?;
    assert!(all.contains("+++ b/a.txt"));
    assert!(all.contains("+++ b/b.txt"));

    let one_path = dir.path().join("a.patch");
    store.export_single_change("sess", &a, &one_path).await?;
    let one = std::fs::read_to_string(&one_path)?;
    assert!(one.contains("-1\n+2\n"));
    assert!(!one.contains("b.txt"));
    Ok(())
}

#[tokio::test]
async fn test_export_of_change_without_diff_fails() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = FileChangeStore::new(dir.path());
    let id = store.record_file_change(new_change(0, "same.txt", Some("x\n"), Some("x\n")))?;

    let result = store
        .export_single_change("sess", &id, &dir.path().join("out.patch"))
        .await;
    assert!(matches!(result, Err(ChangeStoreError::NoDiff(_))));
    Ok(())
}
