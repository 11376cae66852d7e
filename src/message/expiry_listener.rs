use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use super::service::MessageService;
use crate::shared::AppError;
use crate::store::ExpiryStore;

/// Subscribes to store expiry notifications and spawns the task that feeds
/// them, in order, to the message service.
///
/// When the subscription ends, later expirations produce no DELETE events;
/// the store still removes the data.
#[instrument(skip(store, message_service))]
pub async fn start_expiry_listener(
    store: Arc<dyn ExpiryStore>,
    message_service: Arc<MessageService>,
) -> Result<JoinHandle<()>, AppError> {
    let mut subscription = store.subscribe_expirations().await?;

    info!("Starting expiry listener");

    Ok(tokio::spawn(async move {
        let mut handled: u64 = 0;

        while let Some(key) = subscription.recv().await {
            if message_service.on_expiry_notification(&key).await {
                handled += 1;
            }
        }

        warn!(
            handled = handled,
            "Expiry notification stream ended - expired messages will no longer produce DELETE events"
        );
    }))
}
