// Public API - what other modules can use
pub use locks::RoomLocks;
pub use models::{Participant, RoomMeta};
pub use registry::RoomRegistry;
pub use service::RoomService;

// Internal modules
pub mod locks;
pub mod models;
pub mod registry;
pub mod service;
