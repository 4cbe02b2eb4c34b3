pub mod application;
pub mod diff;
pub mod domain;
pub mod infra;
pub mod state;
