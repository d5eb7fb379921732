#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;
use uuid::Uuid;

use sabotage::{
    collab::{DocumentService, InMemoryDocumentService, ReferenceRunner, TestRunner},
    config::{GameConfig, RoomsConfig},
    game::{ChallengeCatalog, GameService},
    room::RoomStore,
    session::{InMemorySessionRegistry, SessionRegistry},
    websockets::{ConnectionManager, WebSocketBroadcaster, WebsocketReceiveHandler},
    ConnectionId,
};

use super::mocks::MockConnectionManager;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// A player connected through the test harness
#[derive(Debug, Clone)]
pub struct TestPlayer {
    pub name: String,
    pub connection: ConnectionId,
    pub id: String,
}

pub struct TestSetup {
    pub service: Arc<GameService>,
    pub input_handler: WebsocketReceiveHandler,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub documents: Arc<InMemoryDocumentService>,
    pub sessions: Arc<InMemorySessionRegistry>,
    pub config: GameConfig,
    pub room_code: String,
    pub players: Vec<TestPlayer>,
}

pub struct TestSetupBuilder {
    players: Vec<String>,
    config: GameConfig,
    rooms: RoomsConfig,
    runner: Arc<dyn TestRunner>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            players: vec![],
            config: GameConfig::default(),
            rooms: RoomsConfig::default(),
            runner: Arc::new(ReferenceRunner::new()),
        }
    }

    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.players = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_players(self) -> Self {
        self.with_players(vec!["alice", "bob"])
    }

    pub fn with_three_players(self) -> Self {
        self.with_players(vec!["alice", "bob", "carol"])
    }

    pub fn with_four_players(self) -> Self {
        self.with_players(vec!["alice", "bob", "carol", "dave"])
    }

    pub fn with_total_rounds(mut self, rounds: u32) -> Self {
        self.config.total_rounds = rounds;
        self
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn TestRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Creates the room with the first player as host, joins the rest, and
    /// clears the join chatter.
    pub async fn build(self) -> TestSetup {
        let mock_conn_manager = Arc::new(MockConnectionManager::new());
        let sessions = Arc::new(InMemorySessionRegistry::new());
        let documents = Arc::new(InMemoryDocumentService::new());

        let broadcaster = Arc::new(WebSocketBroadcaster::new(
            mock_conn_manager.clone() as Arc<dyn ConnectionManager>,
            sessions.clone() as Arc<dyn SessionRegistry>,
        ));
        let store = RoomStore::new(
            self.config.clone(),
            self.rooms,
            documents.clone() as Arc<dyn DocumentService>,
        );
        let service = Arc::new(GameService::new(
            store,
            sessions.clone(),
            broadcaster,
            documents.clone(),
            self.runner,
            Arc::new(ChallengeCatalog::default()),
            self.config.clone(),
        ));
        let input_handler = WebsocketReceiveHandler::new(service.clone(), mock_conn_manager.clone());

        let mut players = Vec::new();
        let mut room_code = String::new();
        for name in &self.players {
            let connection = Uuid::new_v4();
            let joined = if room_code.is_empty() {
                service.create_room(connection, name).await.unwrap()
            } else {
                service.join_room(connection, &room_code, name).await.unwrap()
            };
            room_code = joined.room_code;
            players.push(TestPlayer {
                name: name.clone(),
                connection,
                id: joined.player_id,
            });
        }
        mock_conn_manager.clear_messages().await;

        TestSetup {
            service,
            input_handler,
            mock_conn_manager,
            documents,
            sessions,
            config: self.config,
            room_code,
            players,
        }
    }
}
