//! Route handlers for the RGASS relay server.
//!
//! This module contains all the HTTP route handlers and related types for the Axum server.

use std::sync::Arc;

use axum::{
    Router,
    extract::{State, ws::WebSocketUpgrade},
    response::{Json, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::hub::Hub;
use crate::server::websocket::handle_websocket_connection;

/// Shared application state
pub type AppState = Arc<Hub>;

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub started_at: DateTime<Utc>,
    pub operations: usize,
}

#[derive(Serialize, Debug)]
pub struct TextResponse {
    pub text: String,
}

/// Basic health check endpoint
pub async fn health(State(hub): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running!".to_string(),
        started_at: hub.started_at(),
        operations: hub.operation_count().await,
    })
}

/// Current visible text of the authoritative replica
pub async fn text(State(hub): State<AppState>) -> Json<TextResponse> {
    Json(TextResponse {
        text: hub.text().await,
    })
}

/// WebSocket connection handler for collaborative editing
pub async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, hub))
}

/// Creates and configures the main application router
pub fn create_router(hub: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/text", get(text))
        .route("/ws", get(ws_handler))
        .with_state(hub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::{Identifier, InsertOperation};

    #[tokio::test]
    async fn test_health_and_text_handlers() {
        let hub = Arc::new(Hub::new(1, 8));
        let insert = InsertOperation {
            target: Identifier::head(),
            position: 0,
            text: "shared".to_string(),
            id: Identifier::new(1, 1, 1, 6),
        };
        hub.submit(1, insert.into()).await.unwrap();

        let Json(health) = health(State(hub.clone())).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.operations, 1);
        assert!(health.started_at <= Utc::now());

        let Json(body) = text(State(hub)).await;
        assert_eq!(body.text, "shared");
    }
}
