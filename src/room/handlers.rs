use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{debug, instrument};

use super::types::RoomSnapshot;
use crate::shared::{AppError, AppState};

/// HTTP handler for reading a room's current state
///
/// GET /rooms/:code
#[instrument(name = "get_room", skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let room = state.game_service.room_snapshot(&code).await?;
    debug!(room_code = %room.code, player_count = room.players.len(), "Room fetched");
    Ok(Json(room))
}

/// HTTP handler for listing live room codes
///
/// GET /rooms
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<String>> {
    let mut codes = state.room_store().room_codes().await;
    codes.sort();
    Json(codes)
}
