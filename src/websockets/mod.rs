// Public API
pub use broadcast::BroadcastDispatcher;
pub use connection::{ConnectionHandle, ConnectionId};
pub use handler::{websocket_handler, RelayMessageHandler};
pub use messages::{ClientCommand, ServerEvent};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
mod broadcast;
mod connection;
mod handler;
pub mod messages;
mod socket;
