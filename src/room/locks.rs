use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-room locks ordering joins against the purge that follows the last
/// leave. Entries are dropped again once nobody holds or awaits them.
#[derive(Default)]
pub struct RoomLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, room_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .lock()
            .await
            .entry(room_id.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    /// Releases `guard` and forgets the room's lock if it is idle
    pub async fn unlock(&self, room_id: &str, guard: OwnedMutexGuard<()>) {
        drop(guard);

        let mut locks = self.locks.lock().await;
        // only the map's own reference left
        if locks.get(room_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(room_id);
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
