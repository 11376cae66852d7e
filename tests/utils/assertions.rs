//! Test assertion helpers for frames received by simulated clients
#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;

use super::actions::TestClient;

const FRAME_WAIT: Duration = Duration::from_millis(500);

// ============================================================================
// Assertion Helpers
// ============================================================================

impl TestClient {
    /// Next queued frame, waiting briefly for background tasks
    pub async fn next_frame(&mut self) -> Option<Value> {
        match timeout(FRAME_WAIT, self.outbox.recv()).await {
            Ok(Some(frame)) => Some(serde_json::from_str(&frame).unwrap()),
            _ => None,
        }
    }

    /// Asserts the next frame has the given `type` and returns it
    pub async fn expect_frame(&mut self, expected_type: &str) -> Value {
        let frame = self
            .next_frame()
            .await
            .unwrap_or_else(|| panic!("expected a {expected_type} frame, got nothing"));
        assert_eq!(
            frame["type"], expected_type,
            "received wrong frame type: {frame}"
        );
        frame
    }

    /// Asserts the next frame is `SYSTEM` with exactly `text`
    pub async fn expect_system(&mut self, text: &str) {
        let frame = self.expect_frame("SYSTEM").await;
        assert_eq!(frame["text"], text);
    }

    /// Asserts nothing is queued right now
    pub fn expect_silence(&mut self) {
        if let Ok(frame) = self.outbox.try_recv() {
            panic!("expected no frames, got {frame}");
        }
    }

    /// Drains everything currently queued
    pub fn drain(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.outbox.try_recv() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }
}
