//! Change record persistence (infrastructure).

pub mod file_store;
pub mod snapshot;
pub mod traits;
pub mod unified;

pub use file_store::{FileChangeStore, NewChange, SessionChanges, normalize_record_path};
pub use snapshot::{GitSnapshots, PromptCommits, SessionCommits, SnapshotSource};
pub use traits::ChangeStore;
pub use unified::{count_diff_lines, generate_unified_diff};
