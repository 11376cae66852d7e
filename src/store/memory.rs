use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, instrument};

use super::{keys::glob_matches, ExpirySubscription, ExpiryStore};
use crate::shared::AppError;

struct Entry {
    value: String,
    deadline: Instant,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<String, Entry>,
    /// Added to the wall clock; lets tests move time forward
    clock_offset: Duration,
    subscribers: Vec<mpsc::UnboundedSender<String>>,
}

impl StoreState {
    fn now(&self) -> Instant {
        Instant::now() + self.clock_offset
    }

    fn live_entry(&self, key: &str) -> Option<&Entry> {
        let now = self.now();
        self.entries.get(key).filter(|entry| entry.deadline > now)
    }
}

/// In-memory implementation of ExpiryStore for development and testing
///
/// Expired entries are invisible to reads immediately, but are only removed
/// (and announced to subscribers) by [`InMemoryExpiryStore::sweep`].
pub struct InMemoryExpiryStore {
    state: Mutex<StoreState>,
}

impl Default for InMemoryExpiryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryExpiryStore {
    /// Creates a new empty in-memory store
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Removes every entry past its deadline and notifies subscribers, oldest
    /// deadline first. Returns the number of expired keys.
    pub async fn sweep(&self) -> usize {
        let mut state = self.state.lock().await;
        let now = state.now();

        let mut expired: Vec<(Instant, String)> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .map(|(key, entry)| (entry.deadline, key.clone()))
            .collect();

        if expired.is_empty() {
            return 0;
        }

        expired.sort();
        for (_, key) in &expired {
            state.entries.remove(key);
        }

        state.subscribers.retain(|subscriber| {
            expired
                .iter()
                .all(|(_, key)| subscriber.send(key.clone()).is_ok())
        });

        debug!(expired = expired.len(), "Swept expired keys");
        expired.len()
    }

    /// Moves the store clock forward and sweeps
    pub async fn advance(&self, duration: Duration) -> usize {
        {
            let mut state = self.state.lock().await;
            state.clock_offset += duration;
        }
        self.sweep().await
    }

    /// Runs [`sweep`](Self::sweep) periodically in a background task
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);

        info!(
            period_ms = period.as_millis() as u64,
            "Starting in-memory store sweeper"
        );

        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                store.sweep().await;
            }
        })
    }
}

#[async_trait]
impl ExpiryStore for InMemoryExpiryStore {
    #[instrument(skip(self, value))]
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let deadline = state.now() + ttl;
        state.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                deadline,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let state = self.state.lock().await;
        Ok(state.live_entry(key).map(|entry| entry.value.clone()))
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        let state = self.state.lock().await;
        Ok(state.live_entry(key).is_some())
    }

    #[instrument(skip(self))]
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        if state.live_entry(key).is_none() {
            return Ok(false);
        }

        let deadline = state.now() + ttl;
        if let Some(entry) = state.entries.get_mut(key) {
            entry.deadline = deadline;
        }
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        let was_live = state.live_entry(key).is_some();
        state.entries.remove(key);
        Ok(was_live)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, AppError> {
        let state = self.state.lock().await;
        let now = state.now();
        let mut keys: Vec<String> = state
            .entries
            .iter()
            .filter(|(key, entry)| entry.deadline > now && glob_matches(pattern, key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn subscribe_expirations(&self) -> Result<ExpirySubscription, AppError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.state.lock().await.subscribers.push(sender);
        Ok(receiver)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
