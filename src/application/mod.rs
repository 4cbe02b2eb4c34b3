//! Application layer (use-cases, policies).
//!
//! Orchestrates the diff core with the change and session stores without
//! depending on any particular front end.

pub mod change_view;
pub mod history;

pub use change_view::ChangeView;
