use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum_macros::Display;
use tokio::time::Instant;

use super::timer::RoomTimers;
use crate::collab::{TestCase, TestSuite};
use crate::config::GameConfig;

pub type PlayerId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Lobby,
    Playing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Saboteur,
    Fixer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Winner {
    Saboteur,
    Fixers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    /// Lobby only
    pub is_ready: bool,
    pub role: Option<Role>,
    /// Ejected by vote; stays listed but takes no further part until the
    /// room goes back to the lobby
    pub disabled: bool,
    pub score: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            is_host: false,
            is_ready: false,
            role: None,
            disabled: false,
            score: 0,
        }
    }
}

/// A bug the saboteur may have planted, recognised by a source fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownBug {
    pub signature: String,
    pub description: String,
}

/// The code challenge played in one round.
///
/// The live text belongs to the document service; `last_known_text` is the
/// most recent copy the room has seen, used when the document is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundArtifact {
    pub challenge_id: u32,
    pub title: String,
    pub language: String,
    pub function_name: String,
    pub correct_code: String,
    pub starting_code: String,
    pub bug_description: String,
    pub known_bugs: Vec<KnownBug>,
    pub test_cases: Vec<TestCase>,
    pub last_known_text: String,
}

impl RoundArtifact {
    pub fn test_suite(&self) -> TestSuite {
        TestSuite {
            function_name: self.function_name.clone(),
            reference_solution: self.correct_code.clone(),
            cases: self.test_cases.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub voter_id: PlayerId,
    pub target_id: PlayerId,
}

/// An open accusation. At most one per room.
#[derive(Debug, Clone)]
pub struct AccusationVote {
    pub id: u64,
    pub initiator_id: PlayerId,
    pub initiator_name: String,
    /// One entry per voter, in the order ballots arrived. Never holds skips.
    pub ballots: Vec<Ballot>,
    pub skips: Vec<PlayerId>,
    pub started_at: Instant,
    pub started_at_utc: DateTime<Utc>,
    pub duration: Duration,
}

impl AccusationVote {
    pub fn has_responded(&self, voter_id: &str) -> bool {
        self.ballots.iter().any(|b| b.voter_id == voter_id)
            || self.skips.iter().any(|id| id == voter_id)
    }

    pub fn response_count(&self) -> usize {
        self.ballots.len() + self.skips.len()
    }

    /// Whole seconds left, rounded up
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        let left = self
            .duration
            .saturating_sub(now.saturating_duration_since(self.started_at));
        let secs = left.as_secs();
        if left.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: u32,
    pub saboteur_id: Option<PlayerId>,
    pub bug_free: bool,
    pub reason: String,
}

/// One game session. Owned by the `RoomStore`, mutated only under its lock.
#[derive(Debug)]
pub struct Room {
    pub code: String,
    pub host_id: Option<PlayerId>,
    /// Join order; used for host promotion
    pub players: Vec<Player>,
    pub phase: Phase,
    pub current_round: u32,
    pub total_rounds: u32,
    /// `None` between rounds and outside of play
    pub round_started_at: Option<Instant>,
    pub round_duration: Duration,
    pub timer_paused: bool,
    pub paused_remaining_secs: Option<i64>,
    /// Elapsed round time captured by a pause, restored on resume
    pub paused_elapsed: Option<Duration>,
    pub saboteur_id: Option<PlayerId>,
    pub fixer_ids: Vec<PlayerId>,
    pub artifact: Option<RoundArtifact>,
    /// Bumped every time a round starts
    pub round_serial: u64,
    pub accused_player_id: Option<PlayerId>,
    /// Someone buzzed during the current round
    pub round_buzzed: bool,
    pub active_vote: Option<AccusationVote>,
    pub next_vote_id: u64,
    pub winner: Option<Winner>,
    pub win_reason: Option<String>,
    /// Last game's saboteur, kept for the results screen
    pub revealed_saboteur_id: Option<PlayerId>,
    pub round_history: Vec<RoundSummary>,
    pub created_at: Instant,
    pub created_at_utc: DateTime<Utc>,
    pub empty_room_deadline: Option<Instant>,
    /// Set once the room has been removed from the store
    pub closed: bool,
    pub timers: RoomTimers,
}

impl Room {
    pub fn new(code: String, config: &GameConfig) -> Self {
        Self {
            code,
            host_id: None,
            players: Vec::new(),
            phase: Phase::Lobby,
            current_round: 0,
            total_rounds: config.total_rounds,
            round_started_at: None,
            round_duration: config.round_duration(),
            timer_paused: false,
            paused_remaining_secs: None,
            paused_elapsed: None,
            saboteur_id: None,
            fixer_ids: Vec::new(),
            artifact: None,
            round_serial: 0,
            accused_player_id: None,
            round_buzzed: false,
            active_vote: None,
            next_vote_id: 1,
            winner: None,
            win_reason: None,
            revealed_saboteur_id: None,
            round_history: Vec::new(),
            created_at: Instant::now(),
            created_at_utc: Utc::now(),
            empty_room_deadline: None,
            closed: false,
            timers: RoomTimers::default(),
        }
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn has_player(&self, id: &str) -> bool {
        self.player(id).is_some()
    }

    pub fn player_name(&self, id: &str) -> Option<String> {
        self.player(id).map(|p| p.name.clone())
    }

    /// Adds a player. Whoever joins an empty room becomes host.
    pub fn add_player(&mut self, id: PlayerId, name: String) {
        let mut player = Player::new(id, name);
        if self.players.is_empty() {
            self.set_host(None);
            player.is_host = true;
            self.host_id = Some(player.id.clone());
        }
        self.players.push(player);
    }

    /// Removes a player, promoting the earliest remaining joiner if the
    /// host left.
    pub fn remove_player(&mut self, id: &str) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == id)?;
        let removed = self.players.remove(index);

        if self.host_id.as_deref() == Some(id) {
            let next = self.players.first().map(|p| p.id.clone());
            self.set_host(next);
        }

        Some(removed)
    }

    fn set_host(&mut self, id: Option<PlayerId>) {
        for player in &mut self.players {
            player.is_host = Some(&player.id) == id.as_ref();
        }
        self.host_id = id;
    }

    pub fn is_host(&self, id: &str) -> bool {
        self.host_id.as_deref() == Some(id)
    }

    pub fn enabled_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.disabled)
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled_players().count()
    }

    /// True while a round clock is running and actions are accepted
    pub fn is_round_live(&self) -> bool {
        self.phase == Phase::Playing && self.round_started_at.is_some()
    }

    /// Marks the room dead and stops every timer it owns
    pub fn close(&mut self) {
        self.closed = true;
        self.empty_room_deadline = None;
        self.timers.cancel_all();
    }
}
