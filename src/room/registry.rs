use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::debug;

use super::models::Participant;
use crate::shared::AppError;
use crate::websockets::{ConnectionHandle, ConnectionId};

#[derive(Default)]
struct RegistryState {
    participants: HashMap<ConnectionId, Participant>,
    rooms: HashMap<String, HashSet<ConnectionId>>,
}

impl RegistryState {
    fn remove(&mut self, connection_id: ConnectionId) -> Option<Participant> {
        let participant = self.participants.remove(&connection_id)?;

        if let Some(occupants) = self.rooms.get_mut(&participant.room_id) {
            occupants.remove(&connection_id);
            if occupants.is_empty() {
                self.rooms.remove(&participant.room_id);
            }
        }

        Some(participant)
    }
}

/// Who is currently connected to which room
///
/// Both indices sit behind one lock, so every lookup sees a state where
/// `participants` and `rooms` agree.
#[derive(Default)]
pub struct RoomRegistry {
    state: Mutex<RegistryState>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the participant record for `connection`
    pub async fn register(
        &self,
        connection: ConnectionHandle,
        name: &str,
        room_id: &str,
    ) -> Result<(), AppError> {
        if name.is_empty() || room_id.is_empty() {
            return Err(AppError::InvalidCommand(
                "name and room id must not be empty".to_string(),
            ));
        }

        let connection_id = connection.id();
        let mut state = self.state.lock().await;

        // a connection sits in at most one room
        state.remove(connection_id);

        state
            .rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(connection_id);
        state.participants.insert(
            connection_id,
            Participant {
                connection,
                name: name.to_string(),
                room_id: room_id.to_string(),
            },
        );

        debug!(
            connection_id = %connection_id,
            room_id = %room_id,
            name = %name,
            "Participant registered"
        );
        Ok(())
    }

    /// Removes the participant for `connection_id`. Safe to call repeatedly.
    pub async fn unregister(&self, connection_id: ConnectionId) -> Option<Participant> {
        let removed = self.state.lock().await.remove(connection_id);

        if let Some(participant) = &removed {
            debug!(
                connection_id = %connection_id,
                room_id = %participant.room_id,
                "Participant unregistered"
            );
        }

        removed
    }

    pub async fn participant(&self, connection_id: ConnectionId) -> Option<Participant> {
        self.state
            .lock()
            .await
            .participants
            .get(&connection_id)
            .cloned()
    }

    pub async fn occupants_of(&self, room_id: &str) -> Vec<ConnectionHandle> {
        self.with_occupants(room_id, |occupants| {
            occupants.into_iter().cloned().collect()
        })
        .await
    }

    pub async fn is_room_empty(&self, room_id: &str) -> bool {
        !self.state.lock().await.rooms.contains_key(room_id)
    }

    /// Runs `f` over the room's occupants with the registry locked, so no
    /// registration can interleave with it
    pub async fn with_occupants<R>(
        &self,
        room_id: &str,
        f: impl FnOnce(Vec<&ConnectionHandle>) -> R,
    ) -> R {
        let state = self.state.lock().await;

        let occupants: Vec<&ConnectionHandle> = state
            .rooms
            .get(room_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.participants.get(id))
                    .map(|participant| &participant.connection)
                    .collect()
            })
            .unwrap_or_default();

        f(occupants)
    }

    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.participants.len()
    }

    pub async fn room_count(&self) -> usize {
        self.state.lock().await.rooms.len()
    }
}
