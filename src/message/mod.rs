// Public API - what other modules can use
pub use expiry_listener::start_expiry_listener;
pub use models::MessageModel;
pub use service::MessageService;

// Internal modules
mod expiry_listener;
pub mod models;
pub mod service;
