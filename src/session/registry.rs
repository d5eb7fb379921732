use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::room::PlayerId;

/// Transient handle of one socket connection
pub type ConnectionId = Uuid;

/// Who a connection speaks for, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBinding {
    pub player_id: PlayerId,
    pub room_code: String,
}

/// Maps connections to the player and room they act as.
///
/// Inbound events are routed through this, never through identity the
/// client claims. Each entry is written only by its own connection's
/// join and disconnect handling.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Binds a connection, returning whatever it was bound to before
    async fn bind(&self, connection: ConnectionId, binding: SessionBinding)
        -> Option<SessionBinding>;

    async fn resolve(&self, connection: ConnectionId) -> Option<SessionBinding>;

    async fn unbind(&self, connection: ConnectionId) -> Option<SessionBinding>;

    async fn connections_in_room(&self, room_code: &str) -> Vec<ConnectionId>;
}

pub struct InMemorySessionRegistry {
    bindings: Arc<RwLock<HashMap<ConnectionId, SessionBinding>>>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self {
            bindings: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemorySessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRegistry for InMemorySessionRegistry {
    async fn bind(
        &self,
        connection: ConnectionId,
        binding: SessionBinding,
    ) -> Option<SessionBinding> {
        debug!(
            connection_id = %connection,
            player_id = %binding.player_id,
            room_code = %binding.room_code,
            "Binding connection"
        );
        let mut bindings = self.bindings.write().await;
        bindings.insert(connection, binding)
    }

    async fn resolve(&self, connection: ConnectionId) -> Option<SessionBinding> {
        let bindings = self.bindings.read().await;
        bindings.get(&connection).cloned()
    }

    async fn unbind(&self, connection: ConnectionId) -> Option<SessionBinding> {
        let mut bindings = self.bindings.write().await;
        let removed = bindings.remove(&connection);
        if removed.is_some() {
            debug!(connection_id = %connection, "Unbound connection");
        }
        removed
    }

    async fn connections_in_room(&self, room_code: &str) -> Vec<ConnectionId> {
        let bindings = self.bindings.read().await;
        bindings
            .iter()
            .filter(|(_, binding)| binding.room_code == room_code)
            .map(|(connection, _)| *connection)
            .collect()
    }
}
