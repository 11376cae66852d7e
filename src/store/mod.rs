// Expiry store adapter
//
// The relay keeps rooms and messages in an external key/value store with
// per-key TTLs. The store decides when things expire and tells us through
// an expiry notification stream.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::shared::AppError;

// Public API - what other modules can use
pub use memory::InMemoryExpiryStore;
pub use redis_store::RedisExpiryStore;

// Internal modules
pub mod keys;
mod memory;
mod redis_store;

/// Names of expired keys, in the order the store reported them
pub type ExpirySubscription = mpsc::UnboundedReceiver<String>;

/// Key/value store with per-key TTL and expiry notifications
#[async_trait]
pub trait ExpiryStore: Send + Sync {
    /// `SET key value EX ttl`
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError>;

    /// `GET key`
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// `EXISTS key`
    async fn exists(&self, key: &str) -> Result<bool, AppError>;

    /// `EXPIRE key ttl`. Returns false if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, AppError>;

    /// `DEL key`. Returns false if the key did not exist.
    async fn delete(&self, key: &str) -> Result<bool, AppError>;

    /// `KEYS pattern`, where `*` matches any run of characters
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, AppError>;

    /// Subscribe to expiry notifications
    async fn subscribe_expirations(&self) -> Result<ExpirySubscription, AppError>;

    /// Liveness probe
    async fn ping(&self) -> Result<(), AppError>;
}

/// TTL as whole seconds, never below one (Redis rejects `EX 0`)
pub(crate) fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
