use serde::Serialize;
use strum_macros::AsRefStr;

use crate::game::vote::VoteTally;
use crate::room::{PlayerId, RoomSnapshot, RoundSummary, VoteSnapshot, Winner};

/// Things that happened in a room, as announced to its players.
///
/// Serialises to the event's payload only; the event name travels
/// separately (see `GameEvent::name`).
#[derive(Debug, Clone, PartialEq, Serialize, AsRefStr)]
#[serde(untagged)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    RoomUpdated {
        room: RoomSnapshot,
    },

    PlayerJoined {
        player_id: PlayerId,
        player_name: String,
        room: RoomSnapshot,
    },

    PlayerLeft {
        player_id: PlayerId,
        room: RoomSnapshot,
    },

    GameStarted {
        room: RoomSnapshot,
    },

    RoundStarted {
        room: RoomSnapshot,
    },

    TimerUpdate {
        remaining: i64,
    },

    /// An accusation opened a vote
    PlayerBuzzed {
        player_id: PlayerId,
        player_name: String,
        vote: VoteSnapshot,
    },

    VoteUpdated {
        vote: VoteSnapshot,
    },

    VoteTimeUpdate {
        remaining: u64,
    },

    VoteEnded {
        #[serde(flatten)]
        tally: VoteTally,
        reason: Option<String>,
    },

    PlayerDisabled {
        player_id: PlayerId,
        player_name: String,
        room: RoomSnapshot,
    },

    VoteCancelled {
        reason: String,
        room: RoomSnapshot,
    },

    FixSubmitted {
        player_id: PlayerId,
        player_name: String,
        passed: bool,
        passed_count: usize,
        total_count: usize,
        /// Revealed only for a passing fix
        correct_code: Option<String>,
        bug_description: Option<String>,
    },

    CodeUpdated {
        player_id: PlayerId,
        code: String,
    },

    RoundEnded {
        summary: RoundSummary,
        room: RoomSnapshot,
    },

    GameEnded {
        winner: Winner,
        reason: String,
        room: RoomSnapshot,
    },

    GameReset {
        room: RoomSnapshot,
    },

    /// A line of room chat. System lines have no `player_id`.
    ChatMessage {
        player_id: Option<PlayerId>,
        username: String,
        message: String,
        system: bool,
    },
}

impl GameEvent {
    /// Wire name, e.g. `VOTE_ENDED`
    pub fn name(&self) -> &str {
        self.as_ref()
    }
}
