use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::models::{
    AccusationVote, Ballot, Phase, Player, PlayerId, Role, Room, RoundArtifact, RoundSummary,
    Winner,
};
use crate::game::round;

/// Wire form of a room. Only plain lists and objects cross the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub code: String,
    pub host_id: Option<PlayerId>,
    pub players: Vec<PlayerSnapshot>,
    pub phase: Phase,
    pub current_round: u32,
    pub total_rounds: u32,
    pub round_duration_secs: u64,
    pub remaining_secs: Option<i64>,
    pub timer_paused: bool,
    pub saboteur_id: Option<PlayerId>,
    pub fixer_ids: Vec<PlayerId>,
    pub artifact: Option<ArtifactSnapshot>,
    pub accused_player_id: Option<PlayerId>,
    pub active_vote: Option<VoteSnapshot>,
    pub winner: Option<Winner>,
    pub win_reason: Option<String>,
    pub revealed_saboteur_id: Option<PlayerId>,
    pub round_history: Vec<RoundSummary>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub is_ready: bool,
    pub role: Option<Role>,
    pub disabled: bool,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSnapshot {
    pub initiator_id: PlayerId,
    pub initiator_name: String,
    pub ballots: Vec<Ballot>,
    pub skips: Vec<PlayerId>,
    pub voted_count: usize,
    pub skip_count: usize,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub remaining_secs: u64,
}

/// The round's challenge as players see it. The reference solution stays
/// on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSnapshot {
    pub challenge_id: u32,
    pub title: String,
    pub language: String,
    pub function_name: String,
    pub starting_code: String,
}

impl From<&Player> for PlayerSnapshot {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            is_host: player.is_host,
            is_ready: player.is_ready,
            role: player.role,
            disabled: player.disabled,
            score: player.score,
        }
    }
}

impl From<&RoundArtifact> for ArtifactSnapshot {
    fn from(artifact: &RoundArtifact) -> Self {
        Self {
            challenge_id: artifact.challenge_id,
            title: artifact.title.clone(),
            language: artifact.language.clone(),
            function_name: artifact.function_name.clone(),
            starting_code: artifact.starting_code.clone(),
        }
    }
}

impl AccusationVote {
    pub fn snapshot(&self, now: Instant) -> VoteSnapshot {
        VoteSnapshot {
            initiator_id: self.initiator_id.clone(),
            initiator_name: self.initiator_name.clone(),
            ballots: self.ballots.clone(),
            skips: self.skips.clone(),
            voted_count: self.ballots.len(),
            skip_count: self.skips.len(),
            started_at: self.started_at_utc,
            duration_ms: self.duration.as_millis() as u64,
            remaining_secs: self.remaining_secs(now),
        }
    }
}

impl Room {
    pub fn snapshot(&self) -> RoomSnapshot {
        let now = Instant::now();
        RoomSnapshot {
            code: self.code.clone(),
            host_id: self.host_id.clone(),
            players: self.players.iter().map(PlayerSnapshot::from).collect(),
            phase: self.phase,
            current_round: self.current_round,
            total_rounds: self.total_rounds,
            round_duration_secs: self.round_duration.as_secs(),
            remaining_secs: round::remaining_secs(self, now).map(|secs| secs.max(0)),
            timer_paused: self.timer_paused,
            saboteur_id: self.saboteur_id.clone(),
            fixer_ids: self.fixer_ids.clone(),
            artifact: self.artifact.as_ref().map(ArtifactSnapshot::from),
            accused_player_id: self.accused_player_id.clone(),
            active_vote: self.active_vote.as_ref().map(|v| v.snapshot(now)),
            winner: self.winner,
            win_reason: self.win_reason.clone(),
            revealed_saboteur_id: self.revealed_saboteur_id.clone(),
            round_history: self.round_history.clone(),
            created_at: self.created_at_utc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn test_snapshot_serialises_players_as_list() {
        let mut room = Room::new("ROOM".to_string(), &GameConfig::default());
        room.add_player("p1".to_string(), "alice".to_string());
        room.add_player("p2".to_string(), "bob".to_string());

        let json = serde_json::to_value(room.snapshot()).unwrap();

        let players = json["players"].as_array().unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0]["name"], "alice");
        assert_eq!(players[1]["is_host"], false);
        assert_eq!(json["phase"], "lobby");
        assert!(json["active_vote"].is_null());
    }
}
