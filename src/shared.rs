use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::collab::{DocumentService, InMemoryDocumentService, ReferenceRunner};
use crate::config::{GameConfig, RoomsConfig};
use crate::game::{ChallengeCatalog, ErrorKind, GameError, GameService};
use crate::room::RoomStore;
use crate::session::{InMemorySessionRegistry, SessionRegistry};
use crate::websockets::{ConnectionManager, InMemoryConnectionManager, WebSocketBroadcaster};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub game_service: Arc<GameService>,
    pub connection_manager: Arc<dyn ConnectionManager>,
}

impl AppState {
    pub fn new(game_service: Arc<GameService>, connection_manager: Arc<dyn ConnectionManager>) -> Self {
        Self {
            game_service,
            connection_manager,
        }
    }

    /// Wires the in-memory implementation of every collaborator
    pub fn in_memory(game: GameConfig, rooms: RoomsConfig) -> Self {
        let documents: Arc<dyn DocumentService> = Arc::new(InMemoryDocumentService::new());
        let sessions: Arc<dyn SessionRegistry> = Arc::new(InMemorySessionRegistry::new());
        let connection_manager: Arc<dyn ConnectionManager> =
            Arc::new(InMemoryConnectionManager::new());
        let broadcaster = Arc::new(WebSocketBroadcaster::new(
            connection_manager.clone(),
            sessions.clone(),
        ));

        let store = RoomStore::new(game.clone(), rooms, documents.clone());
        let game_service = Arc::new(GameService::new(
            store,
            sessions,
            broadcaster,
            documents,
            Arc::new(ReferenceRunner::new()),
            Arc::new(ChallengeCatalog::default()),
            game,
        ));

        Self::new(game_service, connection_manager)
    }

    pub fn room_store(&self) -> &RoomStore {
        self.game_service.store()
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Game(#[from] GameError),
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidState | ErrorKind::Unsafe => StatusCode::BAD_REQUEST,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Game(error) => (status_for(error.kind()), error.to_string()),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
