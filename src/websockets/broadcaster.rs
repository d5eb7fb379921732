use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

use super::connection_manager::ConnectionManager;
use super::messages::WebSocketMessage;
use crate::event::{GameEvent, RoomBroadcaster};
use crate::session::{ConnectionId, SessionRegistry};

/// Sends room events to every socket bound to the room
pub struct WebSocketBroadcaster {
    connection_manager: Arc<dyn ConnectionManager>,
    sessions: Arc<dyn SessionRegistry>,
}

impl WebSocketBroadcaster {
    pub fn new(
        connection_manager: Arc<dyn ConnectionManager>,
        sessions: Arc<dyn SessionRegistry>,
    ) -> Self {
        Self {
            connection_manager,
            sessions,
        }
    }

    fn encode(event: &GameEvent) -> Option<String> {
        match serde_json::to_string(&WebSocketMessage::event(event)) {
            Ok(json) => Some(json),
            Err(e) => {
                error!(event = %event.name(), error = %e, "Failed to encode event");
                None
            }
        }
    }
}

#[async_trait]
impl RoomBroadcaster for WebSocketBroadcaster {
    async fn emit_to_room(&self, room_code: &str, event: GameEvent) {
        let Some(json) = Self::encode(&event) else {
            return;
        };
        let targets = self.sessions.connections_in_room(room_code).await;
        debug!(room_code = %room_code, event = %event.name(), recipients = targets.len(), "Broadcasting");
        self.connection_manager
            .send_to_connections(&targets, &json)
            .await;
    }

    async fn emit_to_others(&self, sender: ConnectionId, room_code: &str, event: GameEvent) {
        let Some(json) = Self::encode(&event) else {
            return;
        };
        let targets: Vec<ConnectionId> = self
            .sessions
            .connections_in_room(room_code)
            .await
            .into_iter()
            .filter(|connection| *connection != sender)
            .collect();
        self.connection_manager
            .send_to_connections(&targets, &json)
            .await;
    }

    async fn emit_to_sender(&self, sender: ConnectionId, event: GameEvent) {
        let Some(json) = Self::encode(&event) else {
            return;
        };
        self.connection_manager.send_to_connection(sender, &json).await;
    }
}
