use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fade::{
    routes, start_expiry_listener, AppState, ExpiryStore, InMemoryExpiryStore, RedisExpiryStore,
    RelayConfig,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fade=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Fade relay server");

    let config = RelayConfig::from_env();

    // Redis when configured, otherwise an in-memory store swept in-process
    let store: Arc<dyn ExpiryStore> = match &config.redis_url {
        Some(url) => match RedisExpiryStore::connect(url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!(error = %e, "Failed to connect to Redis");
                std::process::exit(1);
            }
        },
        None => {
            warn!("REDIS_URL not set, using in-memory store");
            let store = Arc::new(InMemoryExpiryStore::new());
            store.spawn_sweeper(config.sweep_interval);
            store
        }
    };

    let app_state = AppState::new(store.clone(), &config);

    if let Err(e) = start_expiry_listener(store, app_state.message_service.clone()).await {
        error!(error = %e, "Failed to subscribe to expiry notifications");
        std::process::exit(1);
    }

    let app = routes::app(app_state);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind_addr, error = %e, "Failed to bind listener");
            std::process::exit(1);
        }
    };
    info!("Server running on http://{}", config.bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server error");
    }
}
