use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chat message as stored under `room:<room_id>:message:<id>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageModel {
    pub id: String,
    pub room_id: String,
    pub from: String, // Author display name
    pub text: String,
    pub created_at: i64, // Unix epoch milliseconds
}

impl MessageModel {
    /// Creates a message with a fresh id stamped with the current time
    pub fn new(room_id: String, from: String, text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            room_id,
            from,
            text,
            created_at: Utc::now().timestamp_millis(),
        }
    }
}
