use std::sync::Arc;
use tracing::{debug, error};

use super::connection::{ConnectionHandle, ConnectionId};
use super::messages::ServerEvent;
use crate::room::registry::RoomRegistry;

/// Fans events out to the connections registered in a room
///
/// Delivery is fire-and-forget: a closed or failing connection is skipped
/// and never surfaces as an error to the caller. Fan-out happens under the
/// registry lock, so all members of a room see events in the same order.
pub struct BroadcastDispatcher {
    registry: Arc<RoomRegistry>,
}

impl BroadcastDispatcher {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Sends `event` to every open connection in `room_id`. Returns the
    /// number of connections that accepted it.
    pub async fn broadcast(&self, room_id: &str, event: &ServerEvent) -> usize {
        self.fan_out(room_id, event, None).await
    }

    /// Like [`broadcast`](Self::broadcast), skipping `excluded`
    pub async fn broadcast_except(
        &self,
        room_id: &str,
        event: &ServerEvent,
        excluded: ConnectionId,
    ) -> usize {
        self.fan_out(room_id, event, Some(excluded)).await
    }

    /// Sends `event` to a single connection
    pub fn send_to(&self, connection: &ConnectionHandle, event: &ServerEvent) -> bool {
        let payload = match event.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                error!(event_type = event.event_type(), error = %e, "Failed to serialize event");
                return false;
            }
        };

        let delivered = connection.send(&payload);
        if !delivered {
            debug!(
                connection_id = %connection.id(),
                event_type = event.event_type(),
                "Connection closed before direct send"
            );
        }
        delivered
    }

    async fn fan_out(
        &self,
        room_id: &str,
        event: &ServerEvent,
        excluded: Option<ConnectionId>,
    ) -> usize {
        let payload = match event.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                error!(room_id = %room_id, error = %e, "Failed to serialize broadcast");
                return 0;
            }
        };

        let delivered = self
            .registry
            .with_occupants(room_id, |occupants| {
                let mut delivered = 0;
                for connection in occupants {
                    if Some(connection.id()) == excluded || !connection.is_open() {
                        continue;
                    }
                    if connection.send(&payload) {
                        delivered += 1;
                    } else {
                        debug!(connection_id = %connection.id(), "Skipping closed connection");
                    }
                }
                delivered
            })
            .await;

        debug!(
            room_id = %room_id,
            event_type = event.event_type(),
            receivers = delivered,
            "Room event broadcast"
        );

        delivered
    }
}
