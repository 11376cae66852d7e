use async_trait::async_trait;
use futures::StreamExt;
use redis::{aio::ConnectionManager, Client};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::{ttl_secs, ExpirySubscription, ExpiryStore};
use crate::shared::AppError;

const EXPIRED_EVENTS_PATTERN: &str = "__keyevent@*__:expired";

/// Redis-backed ExpiryStore
///
/// Commands go through a shared `ConnectionManager`, which reconnects on its
/// own. Expiry notifications use a dedicated pub/sub connection per
/// subscription.
pub struct RedisExpiryStore {
    client: Client,
    connection: ConnectionManager,
}

impl RedisExpiryStore {
    /// Connects to Redis and enables expired-key events
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let client = Client::open(url)?;
        let mut connection = ConnectionManager::new(client.clone()).await?;

        let _: String = redis::cmd("PING").query_async(&mut connection).await?;
        info!("Redis connection established");

        // Managed deployments may forbid CONFIG; notifications then depend on server config
        let notify: Result<(), redis::RedisError> = redis::cmd("CONFIG")
            .arg("SET")
            .arg("notify-keyspace-events")
            .arg("Ex")
            .query_async(&mut connection)
            .await;
        if let Err(e) = notify {
            warn!(error = %e, "Could not enable keyspace expiry events");
        }

        Ok(Self { client, connection })
    }
}

#[async_trait]
impl ExpiryStore for RedisExpiryStore {
    #[instrument(skip(self, value))]
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError> {
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        let mut conn = self.connection.clone();
        let count: u64 = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, AppError> {
        let mut conn = self.connection.clone();
        let updated: u64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(updated == 1)
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let mut conn = self.connection.clone();
        let removed: u64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(removed > 0)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, AppError> {
        let mut conn = self.connection.clone();
        let keys: Vec<String> = redis::cmd("KEYS").arg(pattern).query_async(&mut conn).await?;
        Ok(keys)
    }

    async fn subscribe_expirations(&self) -> Result<ExpirySubscription, AppError> {
        let mut pubsub = self.client.get_async_connection().await?.into_pubsub();
        pubsub.psubscribe(EXPIRED_EVENTS_PATTERN).await?;

        info!(pattern = EXPIRED_EVENTS_PATTERN, "Subscribed to Redis expiry events");

        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut messages = pubsub.on_message();

            while let Some(message) = messages.next().await {
                let key: String = match message.get_payload() {
                    Ok(key) => key,
                    Err(e) => {
                        warn!(error = %e, "Undecodable expiry event payload");
                        continue;
                    }
                };

                debug!(key = %key, "Redis key expired");
                if sender.send(key).is_err() {
                    debug!("Expiry subscriber dropped, closing pub/sub connection");
                    return;
                }
            }

            warn!("Redis expiry event stream ended");
        });

        Ok(receiver)
    }

    async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
