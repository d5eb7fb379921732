use async_trait::async_trait;

use super::events::GameEvent;
use crate::session::ConnectionId;

/// Delivers room events to connected players.
///
/// Emitting to a room nobody is listening to is a no-op.
#[async_trait]
pub trait RoomBroadcaster: Send + Sync {
    /// Everyone in the room
    async fn emit_to_room(&self, room_code: &str, event: GameEvent);

    /// Everyone in the room except `sender`
    async fn emit_to_others(&self, sender: ConnectionId, room_code: &str, event: GameEvent);

    /// Only `sender`
    async fn emit_to_sender(&self, sender: ConnectionId, event: GameEvent);
}
