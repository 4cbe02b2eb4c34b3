//! Dual-pane diff core.
//!
//! Builds side-by-side rows from two texts with `similar`, numbers both
//! sides, highlights word changes inside replaced lines, recovers text from
//! unified diffs and collapses unchanged context into expandable hunks.
//! Everything here is synchronous and infallible.

pub mod model;
pub mod patch;
pub mod rows;
pub mod stats;
pub mod window;
pub mod words;

pub use model::{DiffModel, DiffModelCache, TextOrigin, resolve_source};
pub use patch::extract_source_text;
pub use rows::{assign_line_numbers, build_diff_rows, build_rows, split_lines};
pub use stats::{compute_stats, count_rows};
pub use window::{WindowItem, WindowOptions, WindowState, kept_rows, window_rows};
pub use words::{RowHighlight, highlight_row};
