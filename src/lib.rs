// Library crate for the sabotage game server
// This file exposes the public API for integration tests

pub mod collab;
pub mod config;
pub mod event;
pub mod game;
pub mod health;
pub mod room;
pub mod session;
pub mod shared;
pub mod websockets;

use axum::{routing::get, Router};

// Re-export commonly used types for easier access in tests
pub use config::{GameConfig, RoomsConfig, ServerConfig};
pub use event::{GameEvent, RoomBroadcaster};
pub use game::{GameError, GameService};
pub use room::{RoomSnapshot, RoomStore};
pub use session::{ConnectionId, SessionRegistry};
pub use shared::{AppError, AppState};
pub use websockets::{
    ConnectionManager, MessageHandler, MessageType, WebSocketMessage, WebsocketReceiveHandler,
};

/// Every HTTP and WebSocket route the server exposes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(websockets::websocket_handler))
        .route("/health", get(health::health))
        .route("/rooms", get(room::list_rooms))
        .route("/rooms/:code", get(room::get_room))
        .with_state(state)
}
