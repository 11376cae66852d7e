use serde::{Deserialize, Serialize};

use crate::message::models::MessageModel;
use crate::room::models::is_valid_room_code;
use crate::shared::AppError;

pub const MAX_NAME_CHARS: usize = 20;
pub const MAX_ROOM_NAME_CHARS: usize = 50;
pub const MAX_TEXT_CHARS: usize = 500;

/// Client -> Server commands, one JSON object per text frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientCommand {
    CreateRoom {
        name: String,
        #[serde(rename = "roomName")]
        room_name: String,
    },
    Join {
        name: String,
        room: String,
    },
    Message {
        text: String,
    },
}

impl ClientCommand {
    /// Decodes a frame and applies the size/shape limits. Names and text are
    /// trimmed; room codes are upper-cased.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let command: ClientCommand =
            serde_json::from_str(raw).map_err(|e| AppError::InvalidCommand(e.to_string()))?;
        command.validated()
    }

    fn validated(self) -> Result<Self, AppError> {
        match self {
            ClientCommand::CreateRoom { name, room_name } => Ok(ClientCommand::CreateRoom {
                name: bounded("name", &name, MAX_NAME_CHARS)?,
                room_name: bounded("roomName", &room_name, MAX_ROOM_NAME_CHARS)?,
            }),
            ClientCommand::Join { name, room } => {
                let room = room.trim().to_ascii_uppercase();
                if !is_valid_room_code(&room) {
                    return Err(AppError::InvalidCommand(format!(
                        "malformed room code: {room}"
                    )));
                }
                Ok(ClientCommand::Join {
                    name: bounded("name", &name, MAX_NAME_CHARS)?,
                    room,
                })
            }
            ClientCommand::Message { text } => Ok(ClientCommand::Message {
                text: bounded("text", &text, MAX_TEXT_CHARS)?,
            }),
        }
    }
}

fn bounded(field: &str, value: &str, max_chars: usize) -> Result<String, AppError> {
    let value = value.trim();
    let length = value.chars().count();

    if length == 0 || length > max_chars {
        return Err(AppError::InvalidCommand(format!(
            "{field} must be 1-{max_chars} characters, got {length}"
        )));
    }

    Ok(value.to_string())
}

/// Server -> Client events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    RoomCreated {
        room: String,
        #[serde(rename = "roomName")]
        room_name: String,
    },
    RoomMeta {
        #[serde(rename = "roomName")]
        room_name: String,
    },
    System {
        text: String,
    },
    Message {
        id: String,
        from: String,
        text: String,
        #[serde(rename = "createdAt")]
        created_at: i64,
        /// Seconds until the store deletes the message
        #[serde(rename = "expiresIn")]
        expires_in: u64,
    },
    Delete {
        id: String,
    },
    Error {
        message: String,
    },
}

/// Helper functions for creating events
impl ServerEvent {
    pub fn system(text: impl Into<String>) -> Self {
        ServerEvent::System { text: text.into() }
    }

    pub fn joined(name: &str) -> Self {
        Self::system(format!("{name} joined"))
    }

    pub fn left(name: &str) -> Self {
        Self::system(format!("{name} left"))
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    pub fn message(message: &MessageModel, expires_in: u64) -> Self {
        ServerEvent::Message {
            id: message.id.clone(),
            from: message.from.clone(),
            text: message.text.clone(),
            created_at: message.created_at,
            expires_in,
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        ServerEvent::Delete { id: id.into() }
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Wire name of the event, for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            ServerEvent::RoomCreated { .. } => "ROOM_CREATED",
            ServerEvent::RoomMeta { .. } => "ROOM_META",
            ServerEvent::System { .. } => "SYSTEM",
            ServerEvent::Message { .. } => "MESSAGE",
            ServerEvent::Delete { .. } => "DELETE",
            ServerEvent::Error { .. } => "ERROR",
        }
    }
}
