use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::trace;

use crate::session::ConnectionId;

/// The two things a player's socket does: carry text frames each way
#[async_trait]
pub trait SocketWrapper: Send {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError>;

    /// Next text frame from the player, `None` once the socket has closed
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError>;

    async fn close(&mut self) -> Result<(), SocketError>;
}

/// Receives every text frame a connection reads
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_message(&self, connection: ConnectionId, message: String);
}

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("Failed to send frame: {0}")]
    SendFailed(String),

    #[error("Failed to receive frame: {0}")]
    ReceiveFailed(String),
}

#[async_trait]
impl SocketWrapper for WebSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.send(Message::Text(message))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        while let Some(frame) = self.next().await {
            match frame.map_err(|e| SocketError::ReceiveFailed(e.to_string()))? {
                Message::Text(text) => return Ok(Some(text)),
                Message::Close(_) => return Ok(None),
                // Pings are answered by axum; binary frames are not part of the protocol
                _ => {}
            }
        }
        Ok(None)
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// What woke the connection loop up
enum Step {
    Outbound(Option<String>),
    Inbound(Result<Option<String>, SocketError>),
}

/// One player's socket for as long as it stays open.
///
/// Frames queued for this connection by the `ConnectionManager` arrive on
/// `outbound`; frames read from the socket go to the `MessageHandler`.
pub struct Connection {
    pub id: ConnectionId,
    socket: Box<dyn SocketWrapper>,
    outbound: mpsc::UnboundedReceiver<String>,
    handler: Arc<dyn MessageHandler>,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        socket: Box<dyn SocketWrapper>,
        outbound: mpsc::UnboundedReceiver<String>,
        handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            id,
            socket,
            outbound,
            handler,
        }
    }

    /// Pumps frames both ways until either side goes away
    pub async fn run(mut self) -> Result<(), SocketError> {
        loop {
            let step = tokio::select! {
                frame = self.outbound.recv() => Step::Outbound(frame),
                frame = self.socket.receive_message() => Step::Inbound(frame),
            };

            match step {
                Step::Outbound(Some(frame)) => self.socket.send_message(frame).await?,
                Step::Inbound(Ok(Some(frame))) => {
                    trace!(connection_id = %self.id, "Frame received");
                    self.handler.handle_message(self.id, frame).await;
                }
                Step::Outbound(None) | Step::Inbound(Ok(None)) => break,
                Step::Inbound(Err(e)) => return Err(e),
            }
        }

        let _ = self.socket.close().await;
        Ok(())
    }
}
