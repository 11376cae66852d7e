use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use fade::{start_expiry_listener, AppState, InMemoryExpiryStore, RelayConfig, RelayMessageHandler};

use super::mocks::FlakyStore;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    /// Backing store; use it to move the clock
    pub memory: Arc<InMemoryExpiryStore>,
    /// What the relay talks to
    pub store: Arc<FlakyStore>,
    pub input_handler: RelayMessageHandler,
    pub _listener_handle: JoinHandle<()>,
}

pub struct TestSetupBuilder {
    config: RelayConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            config: RelayConfig::default(),
        }
    }

    #[allow(dead_code)]
    pub fn with_message_ttl(mut self, ttl: Duration) -> Self {
        self.config.message_ttl = ttl;
        self
    }

    #[allow(dead_code)]
    pub fn with_room_ttl(mut self, ttl: Duration) -> Self {
        self.config.room_ttl = ttl;
        self
    }

    pub async fn build(self) -> TestSetup {
        let memory = Arc::new(InMemoryExpiryStore::new());
        let store = Arc::new(FlakyStore::new(memory.clone()));

        let state = AppState::new(store.clone(), &self.config);
        let listener_handle = start_expiry_listener(store.clone(), state.message_service.clone())
            .await
            .unwrap();

        let input_handler = RelayMessageHandler::new(&state);

        TestSetup {
            state,
            memory,
            store,
            input_handler,
            _listener_handle: listener_handle,
        }
    }
}
