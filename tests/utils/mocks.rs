#![allow(dead_code)] // Test utilities may not all be used in every test

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use sabotage::{websockets::ConnectionManager, ConnectionId, WebSocketMessage};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Records everything sent to each connection instead of writing to a socket
#[derive(Clone)]
pub struct MockConnectionManager {
    sent_messages: Arc<RwLock<HashMap<ConnectionId, VecDeque<String>>>>,
    connected: Arc<RwLock<Vec<ConnectionId>>>,
}

impl MockConnectionManager {
    pub fn new() -> Self {
        Self {
            sent_messages: Arc::new(RwLock::new(HashMap::new())),
            connected: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn is_connected(&self, connection: ConnectionId) -> bool {
        self.connected.read().await.contains(&connection)
    }

    /// Every message sent to `connection` so far, oldest first
    pub async fn get_messages_for(&self, connection: ConnectionId) -> Vec<WebSocketMessage> {
        self.sent_messages
            .read()
            .await
            .get(&connection)
            .map(|queue| {
                queue
                    .iter()
                    .map(|raw| serde_json::from_str(raw).unwrap())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Pops the oldest message sent to `connection`
    pub async fn consume_message_for(&self, connection: ConnectionId) -> Option<WebSocketMessage> {
        self.sent_messages
            .write()
            .await
            .get_mut(&connection)
            .and_then(|queue| queue.pop_front())
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    pub async fn clear_messages(&self) {
        self.sent_messages.write().await.clear();
    }
}

#[async_trait]
impl ConnectionManager for MockConnectionManager {
    async fn add_connection(&self, connection: ConnectionId, _sender: mpsc::UnboundedSender<String>) {
        self.connected.write().await.push(connection);
    }

    async fn remove_connection(&self, connection: ConnectionId) {
        self.connected.write().await.retain(|c| *c != connection);
    }

    async fn send_to_connection(&self, connection: ConnectionId, message: &str) {
        self.sent_messages
            .write()
            .await
            .entry(connection)
            .or_default()
            .push_back(message.to_string());
    }

    async fn send_to_connections(&self, connections: &[ConnectionId], message: &str) {
        for connection in connections {
            self.send_to_connection(*connection, message).await;
        }
    }
}
