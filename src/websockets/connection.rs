use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identity of one live client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outbound side of a client connection
///
/// The socket loop owns the receiving half of `sender` and writes whatever
/// arrives to the client. Once that loop is gone the handle reports closed.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<String>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, sender: mpsc::UnboundedSender<String>) -> Self {
        Self { id, sender }
    }

    /// Creates a handle with a fresh id together with its outbound receiver
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(ConnectionId::new(), sender), receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queues a frame for the client. Returns false if the connection is gone.
    pub fn send(&self, payload: &str) -> bool {
        self.sender.send(payload.to_string()).is_ok()
    }
}
