use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::session::ConnectionId;

/// Outbound channels of every open socket
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    async fn add_connection(&self, connection: ConnectionId, sender: mpsc::UnboundedSender<String>);

    async fn remove_connection(&self, connection: ConnectionId);

    async fn send_to_connection(&self, connection: ConnectionId, message: &str);

    async fn send_to_connections(&self, connections: &[ConnectionId], message: &str);
}

pub struct InMemoryConnectionManager {
    connections: Arc<RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<String>>>>,
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(&self, connection: ConnectionId, sender: mpsc::UnboundedSender<String>) {
        let mut connections = self.connections.write().await;
        connections.insert(connection, sender);
        debug!(connection_id = %connection, open = connections.len(), "Connection registered");
    }

    async fn remove_connection(&self, connection: ConnectionId) {
        let mut connections = self.connections.write().await;
        connections.remove(&connection);
    }

    async fn send_to_connection(&self, connection: ConnectionId, message: &str) {
        let connections = self.connections.read().await;
        if let Some(sender) = connections.get(&connection) {
            // A closed receiver just means the socket is going away
            let _ = sender.send(message.to_string());
        }
    }

    async fn send_to_connections(&self, targets: &[ConnectionId], message: &str) {
        let connections = self.connections.read().await;
        for connection in targets {
            if let Some(sender) = connections.get(connection) {
                let _ = sender.send(message.to_string());
            }
        }
    }
}
