use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, info};

use super::errors::GameError;
use super::roles::{assign_roles, clear_roles};
use super::scoring;
use super::win::{self, CodeVerdict};
use crate::room::{Phase, Room, RoundArtifact, RoundSummary, Winner};

/// Seconds left on the round clock. Frozen while paused, `None` between
/// rounds, negative once the clock has run out.
pub fn remaining_secs(room: &Room, now: Instant) -> Option<i64> {
    if room.timer_paused {
        return room.paused_remaining_secs;
    }
    let started = room.round_started_at?;
    let elapsed = now.saturating_duration_since(started).as_secs() as i64;
    Some(room.round_duration.as_secs() as i64 - elapsed)
}

/// Moves a lobby into its first round. Nothing is changed on error.
pub fn start_game<R: Rng + ?Sized>(
    room: &mut Room,
    artifact: RoundArtifact,
    min_players: usize,
    rng: &mut R,
    now: Instant,
) -> Result<(), GameError> {
    if room.phase != Phase::Lobby {
        return Err(GameError::GameInProgress);
    }
    if room.players.len() < min_players {
        return Err(GameError::NotEnoughPlayers { min: min_players });
    }

    room.phase = Phase::Playing;
    room.current_round = 1;
    room.winner = None;
    room.win_reason = None;
    room.revealed_saboteur_id = None;
    room.round_history.clear();
    for player in &mut room.players {
        player.disabled = false;
    }

    assign_roles(room, rng);
    start_round(room, artifact, now);

    info!(
        room_code = %room.code,
        player_count = room.players.len(),
        total_rounds = room.total_rounds,
        "Game started"
    );
    Ok(())
}

/// Installs the round's artifact and starts the round clock
pub fn start_round(room: &mut Room, artifact: RoundArtifact, now: Instant) {
    debug!(
        room_code = %room.code,
        round = room.current_round,
        challenge = %artifact.title,
        "Starting round"
    );
    room.artifact = Some(artifact);
    room.round_serial += 1;
    room.accused_player_id = None;
    room.round_buzzed = false;
    room.active_vote = None;
    room.round_started_at = Some(now);
    clear_pause(room);
}

fn clear_pause(room: &mut Room) {
    room.timer_paused = false;
    room.paused_remaining_secs = None;
    room.paused_elapsed = None;
}

/// Freezes the round clock, remembering how far the round had got
pub fn pause_timer(room: &mut Room, now: Instant) {
    if room.timer_paused {
        return;
    }
    let Some(started) = room.round_started_at else {
        return;
    };

    let elapsed = now.saturating_duration_since(started);
    room.paused_elapsed = Some(elapsed);
    room.paused_remaining_secs =
        Some((room.round_duration.as_secs() as i64 - elapsed.as_secs() as i64).max(0));
    room.timer_paused = true;
}

/// Restarts the clock so that the elapsed time before the pause is kept
pub fn resume_timer(room: &mut Room, now: Instant) {
    if !room.timer_paused {
        return;
    }
    if let (Some(elapsed), Some(_)) = (room.paused_elapsed, room.round_started_at) {
        room.round_started_at = Some(now.checked_sub(elapsed).unwrap_or(now));
    }
    clear_pause(room);
}

/// Stops the round from accepting actions while its end is pending
pub fn freeze_round(room: &mut Room) {
    room.round_started_at = None;
    room.accused_player_id = None;
    room.active_vote = None;
    clear_pause(room);
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    /// Roles rotated; the next round starts after the interstitial
    NextRound,
    GameOver { winner: Winner, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundEnd {
    pub summary: RoundSummary,
    pub outcome: RoundOutcome,
}

/// Closes the current round, judging `final_text` against the round's known
/// bugs. The last round decides the game; earlier rounds rotate roles.
pub fn end_round<R: Rng + ?Sized>(room: &mut Room, final_text: &str, rng: &mut R) -> RoundEnd {
    let verdict = match room.artifact.as_mut() {
        Some(artifact) => {
            artifact.last_known_text = final_text.to_string();
            win::inspect_code(artifact, final_text)
        }
        None => CodeVerdict::Clean,
    };

    let summary = RoundSummary {
        round: room.current_round,
        saboteur_id: room.saboteur_id.clone(),
        bug_free: verdict.is_clean(),
        reason: verdict.reason(),
    };
    room.round_history.push(summary.clone());
    scoring::score_round_end(room);
    freeze_round(room);

    info!(
        room_code = %room.code,
        round = room.current_round,
        bug_free = summary.bug_free,
        reason = %summary.reason,
        "Round ended"
    );

    let outcome = if room.current_round >= room.total_rounds {
        let (winner, reason) = if win::fixers_win(room) {
            (Winner::Fixers, win::SABOTEUR_VOTED_OUT.to_string())
        } else {
            (verdict.winner(), verdict.reason())
        };
        finish_game(room, winner, reason.clone());
        RoundOutcome::GameOver { winner, reason }
    } else {
        room.current_round += 1;
        assign_roles(room, rng);
        RoundOutcome::NextRound
    };

    RoundEnd { summary, outcome }
}

/// Ends the game. The saboteur is revealed and the role slots are cleared.
pub fn finish_game(room: &mut Room, winner: Winner, reason: String) {
    info!(room_code = %room.code, winner = %winner, reason = %reason, "Game over");

    room.phase = Phase::Results;
    room.winner = Some(winner);
    room.win_reason = Some(reason);
    room.revealed_saboteur_id = room.saboteur_id.take();
    room.fixer_ids.clear();
    freeze_round(room);
}

/// Returns a finished game to the lobby
pub fn reset_game(room: &mut Room) -> Result<(), GameError> {
    if room.phase == Phase::Playing {
        return Err(GameError::GameInProgress);
    }
    return_to_lobby(room);
    Ok(())
}

/// Puts the room back in the lobby whatever phase it is in. Used directly
/// when everyone has left a game in progress.
pub fn return_to_lobby(room: &mut Room) {
    room.phase = Phase::Lobby;
    room.current_round = 0;
    room.artifact = None;
    room.winner = None;
    room.win_reason = None;
    room.revealed_saboteur_id = None;
    room.round_history.clear();
    freeze_round(room);
    clear_roles(room);
    for player in &mut room.players {
        player.is_ready = false;
        player.disabled = false;
    }
    scoring::reset_scores(room);

    debug!(room_code = %room.code, "Game reset to lobby");
}
