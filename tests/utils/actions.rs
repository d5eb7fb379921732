#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::json;
use std::time::Duration;

use sabotage::{
    collab::DocumentService,
    room::{Phase, Role, RoomGuard, RoomSnapshot},
    websockets::{MessageHandler, MessageType, WebSocketMessage, WebSocketMessageMeta},
    ConnectionId,
};

use super::setup::{TestPlayer, TestSetup};

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    pub fn player(&self, name: &str) -> &TestPlayer {
        self.players
            .iter()
            .find(|p| p.name == name)
            .unwrap_or_else(|| panic!("no test player named {name}"))
    }

    pub fn conn(&self, name: &str) -> ConnectionId {
        self.player(name).connection
    }

    pub fn id(&self, name: &str) -> String {
        self.player(name).id.clone()
    }

    fn name_of(&self, player_id: &str) -> String {
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| panic!("no test player with id {player_id}"))
    }

    /// Locks the room. Drop the guard before calling into the service again.
    pub async fn room(&self) -> RoomGuard {
        self.service.store().lock_room(&self.room_code).await.unwrap()
    }

    pub async fn snapshot(&self) -> RoomSnapshot {
        self.service.room_snapshot(&self.room_code).await.unwrap()
    }

    pub async fn score(&self, name: &str) -> u32 {
        let id = self.id(name);
        self.snapshot()
            .await
            .players
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.score)
            .unwrap_or_else(|| panic!("{name} is not in the room"))
    }

    /// Name of the current saboteur
    pub async fn saboteur(&self) -> String {
        let snapshot = self.snapshot().await;
        self.name_of(snapshot.saboteur_id.as_deref().expect("no saboteur assigned"))
    }

    /// Names of the current fixers, in join order
    pub async fn fixers(&self) -> Vec<String> {
        let snapshot = self.snapshot().await;
        snapshot
            .players
            .iter()
            .filter(|p| p.role == Some(Role::Fixer))
            .map(|p| self.name_of(&p.id))
            .collect()
    }

    /// Rewrites this round's roles so that `name` is the saboteur
    pub async fn force_saboteur(&self, name: &str) {
        let saboteur_id = self.id(name);
        let mut room = self.room().await;
        assert_eq!(room.phase, Phase::Playing, "roles only exist during a game");
        for player in &mut room.players {
            player.role = Some(if player.id == saboteur_id {
                Role::Saboteur
            } else {
                Role::Fixer
            });
        }
        room.fixer_ids = room
            .players
            .iter()
            .filter(|p| p.id != saboteur_id)
            .map(|p| p.id.clone())
            .collect();
        room.saboteur_id = Some(saboteur_id);
    }

    /// Reference solution of the round in play
    pub async fn correct_code(&self) -> String {
        let room = self.room().await;
        room.artifact.as_ref().unwrap().correct_code.clone()
    }

    /// Buggy code the round started from
    pub async fn starting_code(&self) -> String {
        let room = self.room().await;
        room.artifact.as_ref().unwrap().starting_code.clone()
    }

    /// Current text of the room's shared document
    pub async fn documents_text(&self) -> String {
        self.documents
            .get_document_text(&self.room_code)
            .await
            .unwrap_or_default()
    }

    /// Starts the game as the host and pins the saboteur
    pub async fn start_game_with_saboteur(&self, saboteur: &str) {
        let host = self.players[0].connection;
        self.service.start_game(host).await.unwrap();
        self.force_saboteur(saboteur).await;
        self.clear_messages().await;
    }

    /// Opens a vote as `accuser` and has every listed voter vote for the
    /// listed target (a player name, or "skip")
    pub async fn run_vote(&self, accuser: &str, ballots: &[(&str, &str)]) {
        self.service.accuse(self.conn(accuser)).await.unwrap();
        for (voter, target) in ballots {
            let target = match *target {
                "skip" => "skip".to_string(),
                name => self.id(name),
            };
            self.service
                .cast_vote(self.conn(voter), &target)
                .await
                .unwrap();
        }
    }

    /// Moves the paused test clock forward
    pub async fn advance_secs(&self, secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    /// Clear all recorded messages
    pub async fn clear_messages(&self) {
        self.mock_conn_manager.clear_messages().await;
    }

    // ============================================================================
    // WebSocket Message Actions
    // ============================================================================

    /// Send a raw frame as if it came from `connection`
    pub async fn send_raw(&self, connection: ConnectionId, raw: &str) {
        self.input_handler
            .handle_message(connection, raw.to_string())
            .await;
    }

    /// Send a client message tagged with `request_id`
    pub async fn send_request(
        &self,
        connection: ConnectionId,
        message_type: MessageType,
        payload: serde_json::Value,
        request_id: &str,
    ) {
        let mut message = WebSocketMessage::new(message_type, payload);
        message.meta = Some(WebSocketMessageMeta {
            timestamp: chrono::Utc::now(),
            request_id: Some(request_id.to_string()),
        });
        let raw = serde_json::to_string(&message).unwrap();
        self.send_raw(connection, &raw).await;
    }

    pub async fn send_message(&self, player: &str, message_type: MessageType, payload: serde_json::Value) {
        self.send_request(self.conn(player), message_type, payload, "req")
            .await;
    }

    pub async fn send_start_game(&self, player: &str) {
        self.send_message(player, MessageType::StartGame, json!({}))
            .await;
    }

    pub async fn send_buzz(&self, player: &str) {
        self.send_message(player, MessageType::Buzz, json!({})).await;
    }

    pub async fn send_vote(&self, voter: &str, target: &str) {
        let target = match target {
            "skip" => "skip".to_string(),
            name => self.id(name),
        };
        self.send_message(voter, MessageType::CastVote, json!({ "target": target }))
            .await;
    }

    pub async fn send_update_code(&self, player: &str, code: &str) {
        self.send_message(player, MessageType::UpdateCode, json!({ "code": code }))
            .await;
    }

    pub async fn send_submit_fix(&self, player: &str, code: &str) {
        self.send_message(player, MessageType::SubmitFix, json!({ "code": code }))
            .await;
    }

    pub async fn send_leave(&self, player: &str) {
        self.send_message(player, MessageType::Leave, json!({})).await;
    }

    pub async fn send_chat(&self, player: &str, message: &str) {
        self.send_message(player, MessageType::ChatMessage, json!({ "message": message }))
            .await;
    }
}
