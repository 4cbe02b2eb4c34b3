//! Domain types for changelens
//! Defines the change records, diff rows and conversation messages shared across layers.

pub mod change;
pub mod diff;
pub mod error;
pub mod message;

pub use change::*;
pub use diff::*;
pub use error::*;
pub use message::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_change_type_display_parse() {
        assert_eq!(ChangeType::Create.to_string(), "create");
        assert_eq!(ChangeType::from_str("DELETE").unwrap(), ChangeType::Delete);
        assert!(ChangeType::from_str("rename").is_err());
    }

    #[test]
    fn test_change_source_display_parse() {
        assert_eq!(ChangeSource::Patch.to_string(), "patch");
        assert_eq!(ChangeSource::from_str("Tool").unwrap(), ChangeSource::Tool);
    }

    #[test]
    fn test_change_type_from_contents() {
        let text = Some("x".to_string());
        assert_eq!(ChangeType::from_contents(&None, &text), ChangeType::Create);
        assert_eq!(ChangeType::from_contents(&text, &None), ChangeType::Delete);
        assert_eq!(ChangeType::from_contents(&text, &text), ChangeType::Update);
        assert_eq!(ChangeType::from_contents(&None, &None), ChangeType::Update);
    }

    #[test]
    fn test_record_has_text_ignores_blank_sides() {
        let mut record = ChangeRecord {
            old_content: Some("  \n".into()),
            ..Default::default()
        };
        assert!(!record.has_text());

        record.new_content = Some("fn main() {}\n".into());
        assert!(record.has_text());
        assert_eq!(record.source_text().new_text, "fn main() {}\n");
    }

    #[test]
    fn test_record_deserializes_without_optional_fields() {
        let json = r#"{
            "id": "change_s1_0",
            "session_id": "s1",
            "prompt_index": 2,
            "file_path": "src/lib.rs",
            "change_type": "update",
            "source": "patch",
            "unified_diff": "@@ -1 +1 @@\n-a\n+b\n"
        }"#;
        let record: ChangeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.source, ChangeSource::Patch);
        assert!(record.old_content.is_none());
        assert!(!record.has_text());
    }

    #[test]
    fn test_hunk_placeholder_id_and_count() {
        let hunk = HunkPlaceholder::new(7, 10);
        assert_eq!(hunk.id, "7-10");
        assert_eq!(hunk.count, 3);
    }
}
