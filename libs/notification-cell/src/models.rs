use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a squad channel subscriber receives, serialized as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub channel: String,
    pub event: String,
    pub payload: Value,
    pub sent_at: DateTime<Utc>,
}
