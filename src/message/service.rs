use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::models::MessageModel;
use crate::shared::AppError;
use crate::store::{keys, ExpiryStore};
use crate::websockets::{BroadcastDispatcher, ServerEvent};

/// Creates messages in the store and turns store expiry into DELETE events
pub struct MessageService {
    store: Arc<dyn ExpiryStore>,
    dispatcher: Arc<BroadcastDispatcher>,
    ttl: Duration,
}

impl MessageService {
    pub fn new(
        store: Arc<dyn ExpiryStore>,
        dispatcher: Arc<BroadcastDispatcher>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            dispatcher,
            ttl,
        }
    }

    /// Seconds a message lives, as advertised to clients
    pub fn expires_in_secs(&self) -> u64 {
        self.ttl.as_secs()
    }

    /// Writes a new message with the message TTL. The caller broadcasts the
    /// returned message only if this succeeds.
    #[instrument(skip(self, text))]
    pub async fn create_message(
        &self,
        room_id: &str,
        author: &str,
        text: &str,
    ) -> Result<MessageModel, AppError> {
        let message = MessageModel::new(room_id.to_string(), author.to_string(), text.to_string());
        let key = keys::room_message_key(room_id, &message.id);
        let value = serde_json::to_string(&message)?;

        self.store.set_with_ttl(&key, &value, self.ttl).await?;

        debug!(
            room_id = %room_id,
            message_id = %message.id,
            ttl_secs = self.ttl.as_secs(),
            "Message stored"
        );
        Ok(message)
    }

    /// Reads a live message back from the store
    pub async fn fetch_message(
        &self,
        room_id: &str,
        message_id: &str,
    ) -> Result<Option<MessageModel>, AppError> {
        let key = keys::room_message_key(room_id, message_id);
        match self.store.get(&key).await? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    /// Reacts to the store expiring `key`. Keys outside the room message
    /// namespace are ignored. Returns true if a DELETE was issued.
    pub async fn on_expiry_notification(&self, key: &str) -> bool {
        let Some((room_id, message_id)) = keys::parse_room_message_key(key) else {
            debug!(key = %key, "Ignoring expiry outside message namespace");
            return false;
        };

        let receivers = self
            .dispatcher
            .broadcast(room_id, &ServerEvent::delete(message_id))
            .await;

        debug!(
            room_id = %room_id,
            message_id = %message_id,
            receivers = receivers,
            "Message expired"
        );
        true
    }

    /// Deletes every stored message of a room. Best effort: anything left
    /// behind still expires on its own TTL. Returns the number deleted.
    #[instrument(skip(self))]
    pub async fn purge_room(&self, room_id: &str) -> usize {
        let pattern = keys::room_message_pattern(room_id);
        let message_keys = match self.store.keys(&pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Could not list messages for purge");
                return 0;
            }
        };

        let mut deleted = 0;
        for key in &message_keys {
            match self.store.delete(key).await {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(room_id = %room_id, key = %key, error = %e, "Failed to purge message");
                }
            }
        }

        info!(
            room_id = %room_id,
            found = message_keys.len(),
            deleted = deleted,
            "Purged room messages"
        );
        deleted
    }
}
