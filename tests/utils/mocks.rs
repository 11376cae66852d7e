use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, OwnedMutexGuard};

use fade::{store::ExpirySubscription, AppError, ExpiryStore, InMemoryExpiryStore};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// In-memory store whose writes can be switched off to simulate an outage,
/// and whose `keys` calls can be held at a gate
pub struct FlakyStore {
    inner: Arc<InMemoryExpiryStore>,
    fail_writes: AtomicBool,
    keys_gate: Arc<Mutex<()>>,
    keys_called: Notify,
}

impl FlakyStore {
    pub fn new(inner: Arc<InMemoryExpiryStore>) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            keys_gate: Arc::new(Mutex::new(())),
            keys_called: Notify::new(),
        }
    }

    /// Parks every `keys` call until the returned guard is dropped
    #[allow(dead_code)]
    pub async fn hold_keys(&self) -> OwnedMutexGuard<()> {
        self.keys_gate.clone().lock_owned().await
    }

    /// Resolves once a `keys` call has reached the gate
    #[allow(dead_code)]
    pub async fn keys_reached(&self) {
        self.keys_called.notified().await;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writes(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ExpiryStore for FlakyStore {
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError> {
        self.check_writes()?;
        self.inner.set_with_ttl(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.inner.get(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        self.inner.exists(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, AppError> {
        self.check_writes()?;
        self.inner.expire(key, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        self.check_writes()?;
        self.inner.delete(key).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, AppError> {
        self.keys_called.notify_one();
        let _pass = self.keys_gate.lock().await;
        self.inner.keys(pattern).await
    }

    async fn subscribe_expirations(&self) -> Result<ExpirySubscription, AppError> {
        self.inner.subscribe_expirations().await
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.inner.ping().await
    }
}
