use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::{GameError, GameService};
use crate::session::ConnectionId;
use crate::shared::AppState;

use super::connection_manager::ConnectionManager;
use super::messages::{
    CastVotePayload, ChatPayload, CodePayload, CreateRoomPayload, JoinRoomPayload, MessageType,
    WebSocketMessage,
};
use super::socket::{Connection, MessageHandler};

/// Why a client message could not be carried out
enum RequestError {
    Malformed(String),
    Game(GameError),
}

impl From<GameError> for RequestError {
    fn from(error: GameError) -> Self {
        RequestError::Game(error)
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(error: serde_json::Error) -> Self {
        RequestError::Malformed(format!("Invalid payload: {error}"))
    }
}

type RequestResult = Result<Option<serde_json::Value>, RequestError>;

fn data<T: Serialize>(value: T) -> RequestResult {
    Ok(Some(serde_json::to_value(value)?))
}

/// Turns client messages into game requests and answers each with an `ACK`
pub struct WebsocketReceiveHandler {
    service: Arc<GameService>,
    connection_manager: Arc<dyn ConnectionManager>,
}

impl WebsocketReceiveHandler {
    pub fn new(service: Arc<GameService>, connection_manager: Arc<dyn ConnectionManager>) -> Self {
        Self {
            service,
            connection_manager,
        }
    }

    async fn dispatch(&self, connection: ConnectionId, message: &WebSocketMessage) -> RequestResult {
        let service = &self.service;
        match message.message_type {
            MessageType::CreateRoom => {
                let payload: CreateRoomPayload = message.parse_payload()?;
                data(service.create_room(connection, &payload.player_name).await?)
            }
            MessageType::JoinRoom => {
                let payload: JoinRoomPayload = message.parse_payload()?;
                data(
                    service
                        .join_room(connection, &payload.room_code, &payload.player_name)
                        .await?,
                )
            }
            MessageType::SetReady => data(service.set_ready(connection).await?),
            MessageType::StartGame => data(service.start_game(connection).await?),
            MessageType::Buzz => data(service.accuse(connection).await?),
            MessageType::CastVote => {
                let payload: CastVotePayload = message.parse_payload()?;
                data(service.cast_vote(connection, &payload.target).await?)
            }
            MessageType::SubmitFix => {
                let payload: CodePayload = message.parse_payload()?;
                data(service.submit_fix(connection, &payload.code).await?)
            }
            MessageType::UpdateCode => {
                let payload: CodePayload = message.parse_payload()?;
                service.update_code(connection, &payload.code).await?;
                Ok(None)
            }
            MessageType::PlayAgain => data(service.play_again(connection).await?),
            MessageType::Leave => {
                service.leave(connection).await?;
                Ok(None)
            }
            MessageType::ChatMessage => {
                let payload: ChatPayload = message.parse_payload()?;
                service.send_chat(connection, &payload.message).await?;
                Ok(None)
            }
            other => Err(RequestError::Malformed(format!(
                "{other:?} is not a client message"
            ))),
        }
    }

    async fn reply(&self, connection: ConnectionId, message: WebSocketMessage) {
        match serde_json::to_string(&message) {
            Ok(json) => {
                self.connection_manager
                    .send_to_connection(connection, &json)
                    .await
            }
            Err(e) => warn!(connection_id = %connection, error = %e, "Failed to encode reply"),
        }
    }
}

#[async_trait]
impl MessageHandler for WebsocketReceiveHandler {
    async fn handle_message(&self, connection: ConnectionId, message: String) {
        let ws_message = match serde_json::from_str::<WebSocketMessage>(&message) {
            Ok(ws_message) => ws_message,
            Err(e) => {
                warn!(connection_id = %connection, error = %e, "Failed to parse WebSocket message");
                self.reply(
                    connection,
                    WebSocketMessage::ack_malformed(None, format!("Invalid message: {e}")),
                )
                .await;
                return;
            }
        };

        debug!(
            connection_id = %connection,
            message_type = ?ws_message.message_type,
            "Received message"
        );

        let request_id = ws_message.request_id();
        let ack = match self.dispatch(connection, &ws_message).await {
            Ok(data) => WebSocketMessage::ack_ok(request_id, data),
            Err(RequestError::Game(error)) => {
                debug!(
                    connection_id = %connection,
                    message_type = ?ws_message.message_type,
                    error = %error,
                    "Request rejected"
                );
                WebSocketMessage::ack_error(request_id, &error)
            }
            Err(RequestError::Malformed(reason)) => {
                warn!(connection_id = %connection, reason = %reason, "Malformed request");
                WebSocketMessage::ack_malformed(request_id, reason)
            }
        };
        self.reply(connection, ack).await;
    }
}

/// WebSocket endpoint. GET /ws
///
/// Connections are anonymous until they create or join a room.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> Response {
    debug!("WebSocket connection requested");
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, app_state))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(socket: axum::extract::ws::WebSocket, app_state: AppState) {
    let connection_id = Uuid::new_v4();
    info!(connection_id = %connection_id, "WebSocket connection established");

    // Create the outbound channel (app -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();
    app_state
        .connection_manager
        .add_connection(connection_id, outbound_sender)
        .await;

    let message_handler = Arc::new(WebsocketReceiveHandler::new(
        app_state.game_service.clone(),
        app_state.connection_manager.clone(),
    ));
    let connection = Connection::new(
        connection_id,
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    match connection.run().await {
        Ok(()) => info!(connection_id = %connection_id, "WebSocket connection closed cleanly"),
        Err(e) => warn!(connection_id = %connection_id, error = ?e, "WebSocket connection error"),
    }

    app_state
        .game_service
        .player_disconnected(connection_id)
        .await;
    app_state
        .connection_manager
        .remove_connection(connection_id)
        .await;
}
