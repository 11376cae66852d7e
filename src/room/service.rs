use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::{
    locks::RoomLocks,
    models::{Participant, RoomMeta},
    registry::RoomRegistry,
};
use crate::message::MessageService;
use crate::shared::AppError;
use crate::store::{keys, ExpiryStore};
use crate::websockets::{BroadcastDispatcher, ConnectionHandle, ConnectionId, ServerEvent};

/// How many fresh codes to try before giving up on room creation
const MAX_CODE_ATTEMPTS: usize = 8;

/// Service for handling room business logic
///
/// Room metadata lives in the store with a TTL that every join and message
/// pushes back. Rooms are never closed explicitly; an idle room simply
/// expires and later joins fail with `RoomNotFound`.
pub struct RoomService {
    store: Arc<dyn ExpiryStore>,
    registry: Arc<RoomRegistry>,
    dispatcher: Arc<BroadcastDispatcher>,
    message_service: Arc<MessageService>,
    room_locks: RoomLocks,
    ttl: Duration,
}

impl RoomService {
    pub fn new(
        store: Arc<dyn ExpiryStore>,
        registry: Arc<RoomRegistry>,
        dispatcher: Arc<BroadcastDispatcher>,
        message_service: Arc<MessageService>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            dispatcher,
            message_service,
            room_locks: RoomLocks::new(),
            ttl,
        }
    }

    /// Creates a room with a unique code. Does not register anyone.
    #[instrument(skip(self))]
    pub async fn create_room(&self, owner: &str, room_name: &str) -> Result<RoomMeta, AppError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let room = RoomMeta::new(owner.to_string(), room_name.to_string());
            let key = keys::room_meta_key(&room.id);

            if self.store.exists(&key).await? {
                warn!(room_id = %room.id, attempt = attempt, "Room code collision, regenerating");
                continue;
            }

            let value = serde_json::to_string(&room)?;
            self.store.set_with_ttl(&key, &value, self.ttl).await?;

            info!(
                room_id = %room.id,
                owner = %owner,
                room_name = %room_name,
                "Room created successfully"
            );
            return Ok(room);
        }

        Err(AppError::Internal(
            "could not allocate a unique room code".to_string(),
        ))
    }

    /// Reads room metadata, `None` if the room never existed or expired
    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: &str) -> Result<Option<RoomMeta>, AppError> {
        debug!(room_id = %room_id, "Getting room metadata");
        match self.store.get(&keys::room_meta_key(room_id)).await? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    pub async fn room_exists(&self, room_id: &str) -> Result<bool, AppError> {
        self.store.exists(&keys::room_meta_key(room_id)).await
    }

    /// Joins `connection` to a room under `name`.
    ///
    /// Refreshes the room TTL, registers the participant and tells everyone
    /// else in the room. A connection already sitting in another room leaves
    /// it first; re-joining the same room only updates the display name.
    #[instrument(skip(self, connection), fields(connection_id = %connection.id()))]
    pub async fn join_room(
        &self,
        connection: &ConnectionHandle,
        room_id: &str,
        name: &str,
    ) -> Result<RoomMeta, AppError> {
        info!(room_id = %room_id, name = %name, "Attempting to join room");

        let room = self.get_room(room_id).await?.ok_or(AppError::RoomNotFound)?;

        // the room may lapse between the read and the refresh
        if !self.store.expire(&keys::room_meta_key(room_id), self.ttl).await? {
            return Err(AppError::RoomNotFound);
        }

        let rejoin = match self.registry.participant(connection.id()).await {
            Some(existing) if existing.room_id == room_id => true,
            Some(_) => {
                self.leave_room(connection.id()).await;
                false
            }
            None => false,
        };

        // waits out a purge started by the last occupant leaving
        let guard = self.room_locks.lock(room_id).await;
        let registered = self
            .registry
            .register(connection.clone(), name, room_id)
            .await;
        if registered.is_ok() && !rejoin {
            self.dispatcher
                .broadcast_except(room_id, &ServerEvent::joined(name), connection.id())
                .await;
        }
        self.room_locks.unlock(room_id, guard).await;
        registered?;

        info!(
            room_id = %room_id,
            name = %name,
            rejoin = rejoin,
            "Participant joined room"
        );
        Ok(room)
    }

    /// Pushes the room's expiry back after activity. Failures are logged only.
    pub async fn touch(&self, room_id: &str) {
        match self
            .store
            .expire(&keys::room_meta_key(room_id), self.ttl)
            .await
        {
            Ok(true) => {}
            Ok(false) => debug!(room_id = %room_id, "Room metadata already expired"),
            Err(e) => warn!(room_id = %room_id, error = %e, "Failed to refresh room TTL"),
        }
    }

    /// Removes the connection from its room, announces the departure and
    /// purges the room's messages once nobody is left. Joins to the room
    /// wait until that purge has finished. Room metadata is left
    /// to expire on its own so the code stays joinable for a while.
    ///
    /// Returns the removed participant; `None` if the connection never
    /// joined or already left.
    #[instrument(skip(self))]
    pub async fn leave_room(&self, connection_id: ConnectionId) -> Option<Participant> {
        let participant = self.registry.unregister(connection_id).await?;
        let room_id = participant.room_id.as_str();

        self.dispatcher
            .broadcast(room_id, &ServerEvent::left(&participant.name))
            .await;

        // joins register under the same lock, so nobody can post into the
        // room between the emptiness check and the end of the purge
        let guard = self.room_locks.lock(room_id).await;
        if self.registry.is_room_empty(room_id).await {
            info!(room_id = %room_id, "Room is now empty, purging messages");
            self.message_service.purge_room(room_id).await;
        }
        self.room_locks.unlock(room_id, guard).await;

        info!(
            room_id = %room_id,
            name = %participant.name,
            "Participant left room"
        );
        Some(participant)
    }
}
