use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::event::GameEvent;
use crate::game::GameError;

/// Message types for WebSocket communication
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    // Client -> Server
    CreateRoom,
    JoinRoom,
    SetReady,
    StartGame,
    Buzz,
    CastVote,
    SubmitFix,
    UpdateCode,
    PlayAgain,
    Leave,
    /// Also sent back to the room as the broadcast
    ChatMessage,

    // Server -> Client
    Ack,
    RoomUpdated,
    PlayerJoined,
    PlayerLeft,
    GameStarted,
    RoundStarted,
    TimerUpdate,
    PlayerBuzzed,
    VoteUpdated,
    VoteTimeUpdate,
    VoteEnded,
    PlayerDisabled,
    VoteCancelled,
    FixSubmitted,
    CodeUpdated,
    RoundEnded,
    GameEnded,
    GameReset,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
    /// Set by the client; echoed back in the matching `ACK`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Base structure for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub meta: Option<WebSocketMessageMeta>,
}

/// Client-to-Server message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomPayload {
    pub player_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomPayload {
    pub room_code: String,
    pub player_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastVotePayload {
    /// A player id, or `"skip"`
    pub target: String,
}

/// Shared by `SUBMIT_FIX` and `UPDATE_CODE`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodePayload {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatPayload {
    pub message: String,
}

/// Server-to-Client message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckPayload {
    pub request_id: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
                request_id: None,
            }),
        }
    }

    pub fn request_id(&self) -> Option<String> {
        self.meta.as_ref().and_then(|meta| meta.request_id.clone())
    }

    /// Reads the payload as `T`
    pub fn parse_payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    /// Create an ACK for a successful request
    pub fn ack_ok(request_id: Option<String>, data: Option<serde_json::Value>) -> Self {
        Self::ack(AckPayload {
            request_id,
            success: true,
            error: None,
            error_kind: None,
            data,
        })
    }

    /// Create an ACK for a failed request
    pub fn ack_error(request_id: Option<String>, error: &GameError) -> Self {
        Self::ack(AckPayload {
            request_id,
            success: false,
            error: Some(error.to_string()),
            error_kind: Some(error.kind().to_string()),
            data: None,
        })
    }

    /// Create an ACK for a message the server could not understand
    pub fn ack_malformed(request_id: Option<String>, reason: String) -> Self {
        Self::ack(AckPayload {
            request_id,
            success: false,
            error: Some(reason),
            error_kind: None,
            data: None,
        })
    }

    fn ack(payload: AckPayload) -> Self {
        Self::new(MessageType::Ack, to_payload(&payload))
    }

    /// Create the broadcast for a room event
    pub fn event(event: &GameEvent) -> Self {
        Self::new(event_type(event), to_payload(event))
    }
}

fn to_payload<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        error!(error = %e, "Failed to serialise message payload");
        serde_json::Value::Null
    })
}

fn event_type(event: &GameEvent) -> MessageType {
    match event {
        GameEvent::RoomUpdated { .. } => MessageType::RoomUpdated,
        GameEvent::PlayerJoined { .. } => MessageType::PlayerJoined,
        GameEvent::PlayerLeft { .. } => MessageType::PlayerLeft,
        GameEvent::GameStarted { .. } => MessageType::GameStarted,
        GameEvent::RoundStarted { .. } => MessageType::RoundStarted,
        GameEvent::TimerUpdate { .. } => MessageType::TimerUpdate,
        GameEvent::PlayerBuzzed { .. } => MessageType::PlayerBuzzed,
        GameEvent::VoteUpdated { .. } => MessageType::VoteUpdated,
        GameEvent::VoteTimeUpdate { .. } => MessageType::VoteTimeUpdate,
        GameEvent::VoteEnded { .. } => MessageType::VoteEnded,
        GameEvent::PlayerDisabled { .. } => MessageType::PlayerDisabled,
        GameEvent::VoteCancelled { .. } => MessageType::VoteCancelled,
        GameEvent::FixSubmitted { .. } => MessageType::FixSubmitted,
        GameEvent::CodeUpdated { .. } => MessageType::CodeUpdated,
        GameEvent::RoundEnded { .. } => MessageType::RoundEnded,
        GameEvent::GameEnded { .. } => MessageType::GameEnded,
        GameEvent::GameReset { .. } => MessageType::GameReset,
        GameEvent::ChatMessage { .. } => MessageType::ChatMessage,
    }
}
