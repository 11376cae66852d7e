use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::RelayConfig;
use crate::message::service::MessageService;
use crate::room::{registry::RoomRegistry, service::RoomService};
use crate::store::ExpiryStore;
use crate::websockets::BroadcastDispatcher;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ExpiryStore>,
    pub registry: Arc<RoomRegistry>,
    pub dispatcher: Arc<BroadcastDispatcher>,
    pub room_service: Arc<RoomService>,
    pub message_service: Arc<MessageService>,
}

impl AppState {
    /// Wires the services on top of a store. The registry starts empty.
    pub fn new(store: Arc<dyn ExpiryStore>, config: &RelayConfig) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let dispatcher = Arc::new(BroadcastDispatcher::new(registry.clone()));
        let message_service = Arc::new(MessageService::new(
            store.clone(),
            dispatcher.clone(),
            config.message_ttl,
        ));
        let room_service = Arc::new(RoomService::new(
            store.clone(),
            registry.clone(),
            dispatcher.clone(),
            message_service.clone(),
            config.room_ttl,
        ));

        Self {
            store,
            registry,
            dispatcher,
            room_service,
            message_service,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Connection has not joined a room")]
    NotJoined,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Text sent to the client in an ERROR frame
    pub fn client_message(&self) -> String {
        match self {
            AppError::RoomNotFound => "Room not found".to_string(),
            AppError::InvalidCommand(_) => "Invalid command".to_string(),
            AppError::StoreUnavailable(_) => "Service temporarily unavailable".to_string(),
            AppError::NotJoined => "Join a room first".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::StoreUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::RoomNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidCommand(_) | AppError::NotJoined => StatusCode::BAD_REQUEST,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
