//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use sabotage::websockets::{MessageType, WebSocketMessage};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    players: Vec<&'a str>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for all players in the setup
    pub fn for_all_players(setup: &'a TestSetup) -> Self {
        let players = setup.players.iter().map(|p| p.name.as_str()).collect();
        Self { setup, players }
    }

    /// Create an assertion for specific players
    pub fn for_players(setup: &'a TestSetup, players: Vec<&'a str>) -> Self {
        Self { setup, players }
    }

    /// Assert that every player received at least one message of this type,
    /// all with the same payload. Returns the most recent one (non-consuming).
    pub async fn received_message_type(self, expected_type: MessageType) -> MessageContent {
        let mut payloads = vec![];

        for player in &self.players {
            let message = self
                .setup
                .last_message_of_type(player, expected_type)
                .await;
            assert!(
                message.is_some(),
                "{} should have received {:?}",
                player,
                expected_type
            );
            payloads.push(message.unwrap().payload);
        }

        for (i, payload) in payloads.iter().enumerate().skip(1) {
            assert_eq!(
                payload, &payloads[0],
                "{} payload differs from {}",
                self.players[i], self.players[0]
            );
        }

        MessageContent {
            payload: payloads.swap_remove(0),
        }
    }

    /// Assert that players never received a message of this type
    pub async fn did_not_receive(self, message_type: MessageType) {
        for player in &self.players {
            let count = self.setup.count_message_type(player, message_type).await;
            assert_eq!(count, 0, "{} should not have received {:?}", player, message_type);
        }
    }

    /// Assert that players received no room broadcasts (ACKs are ignored)
    pub async fn received_no_broadcasts(self) {
        for player in &self.players {
            let messages = self.setup.messages_for(player).await;
            let broadcasts: Vec<_> = messages
                .iter()
                .filter(|m| m.message_type != MessageType::Ack)
                .map(|m| m.message_type)
                .collect();
            assert!(
                broadcasts.is_empty(),
                "{} should not have received broadcasts, got {:?}",
                player,
                broadcasts
            );
        }
    }
}

impl TestSetup {
    pub async fn messages_for(&self, player: &str) -> Vec<WebSocketMessage> {
        self.mock_conn_manager
            .get_messages_for(self.conn(player))
            .await
    }

    /// Types of every message `player` received, oldest first
    pub async fn message_types_for(&self, player: &str) -> Vec<MessageType> {
        self.messages_for(player)
            .await
            .into_iter()
            .map(|m| m.message_type)
            .collect()
    }

    /// Count how many messages of a specific type a player received (non-consuming)
    pub async fn count_message_type(&self, player: &str, message_type: MessageType) -> usize {
        self.messages_for(player)
            .await
            .iter()
            .filter(|m| m.message_type == message_type)
            .count()
    }

    pub async fn last_message_of_type(
        &self,
        player: &str,
        message_type: MessageType,
    ) -> Option<WebSocketMessage> {
        self.messages_for(player)
            .await
            .into_iter()
            .rev()
            .find(|m| m.message_type == message_type)
    }

    /// The last ACK `player` received
    pub async fn last_ack(&self, player: &str) -> MessageContent {
        let ack = self
            .last_message_of_type(player, MessageType::Ack)
            .await
            .unwrap_or_else(|| panic!("{player} received no ACK"));
        MessageContent {
            payload: ack.payload,
        }
    }
}

// ============================================================================
// Message Content Assertions
// ============================================================================

#[derive(Debug)]
pub struct MessageContent {
    pub payload: serde_json::Value,
}

impl MessageContent {
    pub fn field(&self, key: &str) -> &serde_json::Value {
        &self.payload[key]
    }

    /// Assert an ACK reports success
    pub fn is_success(self) -> Self {
        assert_eq!(self.payload["success"], true, "expected success, got {}", self.payload);
        self
    }

    /// Assert an ACK reports a failure of the given kind
    pub fn is_error_kind(self, kind: &str) -> Self {
        assert_eq!(self.payload["success"], false, "expected failure, got {}", self.payload);
        assert_eq!(self.payload["error_kind"], kind);
        self
    }

    pub fn with_error(self, message: &str) -> Self {
        assert_eq!(self.payload["error"], message);
        self
    }

    pub fn with_winner(self, winner: &str) -> Self {
        assert_eq!(self.payload["winner"], winner);
        self
    }

    pub fn with_reason(self, reason: &str) -> Self {
        assert_eq!(self.payload["reason"], reason);
        self
    }

    pub fn with_player_id(self, player_id: &str) -> Self {
        assert_eq!(self.payload["player_id"], player_id);
        self
    }

    pub fn with_phase(self, phase: &str) -> Self {
        assert_eq!(self.payload["room"]["phase"], phase);
        self
    }
}
