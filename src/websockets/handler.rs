use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::message::MessageService;
use crate::room::{RoomRegistry, RoomService};
use crate::shared::{AppError, AppState};

use super::broadcast::BroadcastDispatcher;
use super::connection::ConnectionHandle;
use super::messages::{ClientCommand, ServerEvent};
use super::socket::{Connection, MessageHandler};

/// Turns client commands into room and message operations
pub struct RelayMessageHandler {
    registry: Arc<RoomRegistry>,
    dispatcher: Arc<BroadcastDispatcher>,
    room_service: Arc<RoomService>,
    message_service: Arc<MessageService>,
}

impl RelayMessageHandler {
    pub fn new(app_state: &AppState) -> Self {
        Self {
            registry: app_state.registry.clone(),
            dispatcher: app_state.dispatcher.clone(),
            room_service: app_state.room_service.clone(),
            message_service: app_state.message_service.clone(),
        }
    }

    async fn handle_command(
        &self,
        connection: &ConnectionHandle,
        command: ClientCommand,
    ) -> Result<(), AppError> {
        match command {
            ClientCommand::CreateRoom { name, room_name } => {
                let room = self.room_service.create_room(&name, &room_name).await?;
                self.room_service
                    .join_room(connection, &room.id, &name)
                    .await?;

                self.dispatcher.send_to(
                    connection,
                    &ServerEvent::RoomCreated {
                        room: room.id,
                        room_name: room.name,
                    },
                );
            }
            ClientCommand::Join { name, room } => {
                let meta = self.room_service.join_room(connection, &room, &name).await?;

                self.dispatcher.send_to(
                    connection,
                    &ServerEvent::RoomMeta {
                        room_name: meta.name,
                    },
                );
            }
            ClientCommand::Message { text } => {
                let participant = self
                    .registry
                    .participant(connection.id())
                    .await
                    .ok_or(AppError::NotJoined)?;

                let message = self
                    .message_service
                    .create_message(&participant.room_id, &participant.name, &text)
                    .await?;

                self.dispatcher
                    .broadcast(
                        &participant.room_id,
                        &ServerEvent::message(&message, self.message_service.expires_in_secs()),
                    )
                    .await;

                self.room_service.touch(&participant.room_id).await;
            }
        }

        Ok(())
    }

    fn report(&self, connection: &ConnectionHandle, error: AppError) {
        match &error {
            AppError::NotJoined => {
                debug!(connection_id = %connection.id(), "Dropping message from connection without a room");
                return;
            }
            AppError::StoreUnavailable(_) | AppError::Internal(_) => {
                error!(connection_id = %connection.id(), error = %error, "Command failed");
            }
            AppError::RoomNotFound | AppError::InvalidCommand(_) => {
                debug!(connection_id = %connection.id(), error = %error, "Command rejected");
            }
        }

        self.dispatcher
            .send_to(connection, &ServerEvent::error(error.client_message()));
    }
}

#[async_trait]
impl MessageHandler for RelayMessageHandler {
    async fn handle_message(&self, connection: &ConnectionHandle, message: String) {
        // frame bodies carry chat text and never reach the logs
        debug!(
            connection_id = %connection.id(),
            bytes = message.len(),
            "Received message"
        );

        let result = match ClientCommand::parse(&message) {
            Ok(command) => self.handle_command(connection, command).await,
            Err(e) => {
                warn!(
                    connection_id = %connection.id(),
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                Err(e)
            }
        };

        if let Err(e) = result {
            self.report(connection, e);
        }
    }

    async fn handle_disconnect(&self, connection: &ConnectionHandle) {
        match self.room_service.leave_room(connection.id()).await {
            Some(participant) => info!(
                connection_id = %connection.id(),
                room_id = %participant.room_id,
                "Connection left room on disconnect"
            ),
            None => debug!(
                connection_id = %connection.id(),
                "Connection closed without joining a room"
            ),
        }
    }
}

/// WebSocket endpoint
/// GET /ws
pub async fn websocket_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, app_state))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(socket: axum::extract::ws::WebSocket, app_state: AppState) {
    // Create the outbound channel (app -> client)
    let (handle, outbound_receiver) = ConnectionHandle::channel();
    let connection_id = handle.id();

    info!(connection_id = %connection_id, "WebSocket connection established");

    let message_handler = Arc::new(RelayMessageHandler::new(&app_state));
    let connection = Connection::new(handle, Box::new(socket), outbound_receiver, message_handler);

    // Run the connection until disconnect; room cleanup happens inside
    match connection.run().await {
        Ok(()) => {
            info!(connection_id = %connection_id, "WebSocket connection closed cleanly");
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }
}
