use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use fade::{ConnectionHandle, MessageHandler};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

/// A simulated client: its handle plus the frames the relay queued for it
pub struct TestClient {
    pub handle: ConnectionHandle,
    pub outbox: UnboundedReceiver<String>,
}

impl TestSetup {
    pub fn connect(&self) -> TestClient {
        let (handle, outbox) = ConnectionHandle::channel();
        TestClient { handle, outbox }
    }

    /// Deliver a raw text frame as if it came from the client
    pub async fn send_raw(&self, client: &TestClient, frame: &str) {
        self.input_handler
            .handle_message(&client.handle, frame.to_string())
            .await;
    }

    pub async fn send_create_room(&self, client: &TestClient, name: &str, room_name: &str) {
        let frame = json!({"type": "CREATE_ROOM", "name": name, "roomName": room_name});
        self.send_raw(client, &frame.to_string()).await;
    }

    pub async fn send_join(&self, client: &TestClient, name: &str, room: &str) {
        let frame = json!({"type": "JOIN", "name": name, "room": room});
        self.send_raw(client, &frame.to_string()).await;
    }

    pub async fn send_chat(&self, client: &TestClient, text: &str) {
        let frame = json!({"type": "MESSAGE", "text": text});
        self.send_raw(client, &frame.to_string()).await;
    }

    /// Transport close: run teardown and drop the client's channel
    pub async fn disconnect(&self, client: TestClient) {
        self.input_handler.handle_disconnect(&client.handle).await;
        drop(client);
    }

    /// Creates a room from a new client and returns the client with the room code
    pub async fn open_room(&self, owner: &str, room_name: &str) -> (TestClient, String) {
        let mut client = self.connect();
        self.send_create_room(&client, owner, room_name).await;
        let created = client.expect_frame("ROOM_CREATED").await;
        let room = created["room"].as_str().unwrap().to_string();
        (client, room)
    }

    /// Joins a new client to `room` and consumes its ROOM_META
    #[allow(dead_code)]
    pub async fn join_as(&self, name: &str, room: &str) -> TestClient {
        let mut client = self.connect();
        self.send_join(&client, name, room).await;
        client.expect_frame("ROOM_META").await;
        client
    }

    /// Moves the store clock and gives the expiry listener time to fan out
    #[allow(dead_code)]
    pub async fn advance_clock(&self, by: Duration) {
        self.memory.advance(by).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
