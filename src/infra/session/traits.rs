use crate::domain::{NormalizedMessage, SessionStoreError};
use async_trait::async_trait;
use serde_json::Value;

/// Ordered raw event log of an agent session.
#[async_trait]
pub trait SessionEventStore: Send + Sync {
    async fn load_session_history(&self, session_id: &str) -> Result<Vec<Value>, SessionStoreError>;
}

/// Classifies one raw event as a user prompt or assistant turn.
pub trait EventConverter: Send + Sync {
    fn convert(&self, event: &Value) -> Option<NormalizedMessage>;
}
