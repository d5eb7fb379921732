use serde::Serialize;
use strum_macros::{Display, EnumIter};
use thiserror::Error;

/// Broad category of a failed player request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    Forbidden,
    Conflict,
    Unsafe,
    Timeout,
}

/// Errors returned to the player whose request failed.
///
/// None of these ever tear down the room; they are reported to the caller only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room code already in use: {0}")]
    RoomCodeTaken(String),

    #[error("Room is full (max {max} players)")]
    RoomFull { max: usize },

    #[error("Game already in progress")]
    GameInProgress,

    #[error("Need at least {min} players to start")]
    NotEnoughPlayers { min: usize },

    #[error("Only the host can do that")]
    NotHost,

    #[error("Game is not in progress")]
    NotPlaying,

    #[error("Game is not in the lobby")]
    NotInLobby,

    #[error("Wait for the vote to complete")]
    VoteInProgress,

    #[error("No active vote")]
    NoActiveVote,

    #[error("You are not in this room")]
    NotInRoom,

    #[error("You are not connected to a room")]
    NotConnected,

    #[error("You are disabled and cannot accuse")]
    PlayerDisabled,

    #[error("You are disabled and cannot vote")]
    VoterDisabled,

    #[error("You have already voted")]
    AlreadyVoted,

    #[error("Target player not found")]
    TargetNotFound,

    #[error("Cannot vote for an already disabled player")]
    TargetDisabled,

    #[error("You cannot vote for yourself")]
    SelfVote,

    #[error("Invalid player name")]
    InvalidPlayerName,

    #[error("No code challenges available")]
    NoChallenges,

    #[error("Code failed safety checks: {0}")]
    UnsafeCode(String),

    #[error("Code validation timed out")]
    ValidationTimeout,

    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Message is too long (max {max} characters)")]
    MessageTooLong { max: usize },
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::RoomNotFound | GameError::TargetNotFound | GameError::NotInRoom => {
                ErrorKind::NotFound
            }
            GameError::GameInProgress
            | GameError::NotEnoughPlayers { .. }
            | GameError::NotPlaying
            | GameError::NotInLobby
            | GameError::VoteInProgress
            | GameError::NoActiveVote
            | GameError::NotConnected
            | GameError::InvalidPlayerName
            | GameError::NoChallenges
            | GameError::EmptyMessage
            | GameError::MessageTooLong { .. } => ErrorKind::InvalidState,
            GameError::NotHost
            | GameError::PlayerDisabled
            | GameError::VoterDisabled
            | GameError::TargetDisabled
            | GameError::SelfVote => ErrorKind::Forbidden,
            GameError::RoomCodeTaken(_) | GameError::RoomFull { .. } | GameError::AlreadyVoted => {
                ErrorKind::Conflict
            }
            GameError::UnsafeCode(_) => ErrorKind::Unsafe,
            GameError::ValidationTimeout => ErrorKind::Timeout,
        }
    }
}
