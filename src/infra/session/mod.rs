//! Agent session logs (infrastructure).

pub mod converter;
pub mod jsonl;
pub mod traits;

pub use converter::AgentEventConverter;
pub use jsonl::JsonlSessionStore;
pub use traits::{EventConverter, SessionEventStore};
