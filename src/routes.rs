use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::instrument;

use crate::shared::{AppError, AppState};
use crate::websockets::websocket_handler;

/// Builds the HTTP surface: the WebSocket endpoint and a health probe
pub fn app(app_state: AppState) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// GET /health
#[instrument(name = "health_check", skip(app_state))]
async fn health_check(State(app_state): State<AppState>) -> Result<Json<Value>, AppError> {
    app_state.store.ping().await?;

    Ok(Json(json!({
        "status": "ok",
        "connections": app_state.registry.connection_count().await,
        "rooms": app_state.registry.room_count().await,
    })))
}
