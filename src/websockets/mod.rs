// Public API
pub use broadcaster::WebSocketBroadcaster;
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use handler::{websocket_handler, WebsocketReceiveHandler};
pub use messages::{
    AckPayload, CastVotePayload, CodePayload, CreateRoomPayload, JoinRoomPayload, MessageType,
    WebSocketMessage, WebSocketMessageMeta,
};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
mod broadcaster;
mod connection_manager;
mod handler;
mod messages;
mod socket;
