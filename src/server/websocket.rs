//! WebSocket session management for collaborative RGASS editing.
//!
//! Each connection is one editing site. The session sends the operation
//! history on connect, forwards the client's operations to the [`Hub`], and
//! relays every other site's operations back to the client.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{error, info, warn};

use crate::crdt::{Operation, SessionId, SiteId};
use crate::server::hub::{Hub, Relayed};

/// Messages a client may send.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Operation { operation: Operation },
    GetContent,
}

/// Messages sent to clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Everything a new client needs to rebuild the document and start editing
    Init {
        session: SessionId,
        site: SiteId,
        operations: Vec<Operation>,
    },
    Remote {
        operation: Operation,
    },
    Content {
        text: String,
    },
    Error {
        message: String,
    },
}

type SessionError = Box<dyn std::error::Error + Send + Sync>;

/// WebSocket session manager
pub struct WebSocketSession {
    hub: Arc<Hub>,
    site: SiteId,
    session_id: String,
}

impl WebSocketSession {
    /// Create a new WebSocket session with a fresh site id.
    pub fn new(hub: Arc<Hub>) -> Self {
        let site = hub.register();
        Self {
            session_id: generate_session_id(site),
            hub,
            site,
        }
    }

    pub fn site(&self) -> SiteId {
        self.site
    }

    /// Handle the WebSocket connection lifecycle
    pub async fn handle(self, socket: WebSocket) {
        info!("WebSocket session {} established", self.session_id);
        let (mut sink, mut stream) = socket.split();

        // Subscribe before sending the history so nothing falls in between
        let (operations, mut updates) = self.hub.join().await;
        let init = ServerMessage::Init {
            session: self.hub.session(),
            site: self.site,
            operations,
        };
        if let Err(e) = send(&mut sink, &init).await {
            error!("Failed to send initial state to {}: {}", self.session_id, e);
            return;
        }

        if let Err(e) = self.run(&mut sink, &mut stream, &mut updates).await {
            warn!("WebSocket session {} failed: {}", self.session_id, e);
        }
        info!("WebSocket session {} ended", self.session_id);
    }

    async fn run(
        &self,
        sink: &mut SplitSink<WebSocket, Message>,
        stream: &mut SplitStream<WebSocket>,
        updates: &mut broadcast::Receiver<Relayed>,
    ) -> Result<(), SessionError> {
        loop {
            tokio::select! {
                incoming = stream.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = self.handle_text_message(&text).await {
                            send(sink, &reply).await?;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => sink.send(Message::Pong(data)).await?,
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket session {} closed by client", self.session_id);
                        return Ok(());
                    }
                    Some(Ok(_)) => {
                        // Ignore other message types (binary, pong)
                    }
                    Some(Err(e)) => return Err(e.into()),
                },
                update = updates.recv() => match update {
                    Ok(relayed) if relayed.origin == self.site => {}
                    Ok(relayed) => {
                        let message = ServerMessage::Remote { operation: relayed.operation };
                        send(sink, &message).await?;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // The client's replica can no longer be kept causal; it has to rejoin
                        warn!("WebSocket session {} lagged by {} operations", self.session_id, skipped);
                        sink.send(Message::Close(None)).await?;
                        return Ok(());
                    }
                    Err(RecvError::Closed) => return Ok(()),
                },
            }
        }
    }

    /// Handles one client message; returns the direct reply, if any.
    async fn handle_text_message(&self, text: &str) -> Option<ServerMessage> {
        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Failed to parse message from {}: {}", self.session_id, e);
                return Some(ServerMessage::Error {
                    message: format!("malformed message: {e}"),
                });
            }
        };

        match message {
            ClientMessage::Operation { operation } => {
                match self.hub.submit(self.site, operation).await {
                    Ok(()) => None,
                    Err(e) => {
                        warn!("Rejected operation from {}: {}", self.session_id, e);
                        Some(ServerMessage::Error {
                            message: e.to_string(),
                        })
                    }
                }
            }
            ClientMessage::GetContent => Some(ServerMessage::Content {
                text: self.hub.text().await,
            }),
        }
    }
}

/// Send a message to the client as JSON text
async fn send(
    sink: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), SessionError> {
    let json = serde_json::to_string(message)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}

/// Generate a unique session label for logging
pub fn generate_session_id(site: SiteId) -> String {
    format!("session_{}_{}", Utc::now().timestamp_millis(), site)
}

/// Create and handle a new WebSocket session
pub async fn handle_websocket_connection(socket: WebSocket, hub: Arc<Hub>) {
    WebSocketSession::new(hub).handle(socket).await;
}
