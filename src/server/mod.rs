//! Relay server for RGASS operations.
//!
//! This module contains the Axum web server that keeps one authoritative
//! replica and relays operations between WebSocket clients.

pub mod config;
pub mod hub;
pub mod routes;
pub mod websocket;

// Re-export main server functionality
pub use config::{ConfigError, ServerConfig};
pub use hub::{Hub, Relayed};
pub use routes::{AppState, create_router};
pub use websocket::{ClientMessage, ServerMessage, WebSocketSession};
