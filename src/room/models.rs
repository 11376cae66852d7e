use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::websockets::ConnectionHandle;

/// Length of a room code
pub const ROOM_CODE_LENGTH: usize = 6;

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Room metadata as stored under `room:<id>:meta`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMeta {
    pub id: String,  // Short room code shared between clients
    pub name: String, // Human-readable room name
    pub owner: String, // Display name of the creator
    pub created_at: DateTime<Utc>,
}

impl RoomMeta {
    /// Creates room metadata with a freshly generated code
    pub fn new(owner: String, name: String) -> Self {
        Self {
            id: generate_room_code(),
            name,
            owner,
            created_at: Utc::now(),
        }
    }
}

/// A connection that has joined a room under a display name
#[derive(Debug, Clone)]
pub struct Participant {
    pub connection: ConnectionHandle,
    pub name: String,
    pub room_id: String,
}

/// Draws a room code from the thread-local CSPRNG
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// True if `code` has the shape of a generated room code
pub fn is_valid_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LENGTH && code.bytes().all(|b| b.is_ascii_alphanumeric())
}
