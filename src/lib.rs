// Library crate for the Fade relay server
// This file exposes the public API for the binary and integration tests

pub mod config;
pub mod message;
pub mod room;
pub mod routes;
pub mod shared;
pub mod store;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::RelayConfig;
pub use message::{start_expiry_listener, MessageModel, MessageService};
pub use room::{RoomMeta, RoomRegistry, RoomService};
pub use shared::{AppError, AppState};
pub use store::{ExpiryStore, InMemoryExpiryStore, RedisExpiryStore};
pub use websockets::{
    BroadcastDispatcher, ClientCommand, ConnectionHandle, ConnectionId, MessageHandler,
    RelayMessageHandler, ServerEvent,
};
