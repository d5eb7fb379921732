use tracing::debug;

use crate::room::Room;

pub const CORRECT_FIX_POINTS: u32 = 10;
pub const WRONG_FIX_PENALTY: u32 = 5;
pub const UNCHALLENGED_SABOTEUR_POINTS: u32 = 15;

/// Scores a judged fix. Wrong fixes cost points but never push a score
/// below zero.
pub fn score_fix(room: &mut Room, player_id: &str, passed: bool) {
    let Some(player) = room.player_mut(player_id) else {
        return;
    };
    player.score = if passed {
        player.score.saturating_add(CORRECT_FIX_POINTS)
    } else {
        player.score.saturating_sub(WRONG_FIX_PENALTY)
    };
    debug!(player_id = %player_id, passed, score = player.score, "Fix scored");
}

/// Rewards the saboteur for a round nobody buzzed in
pub fn score_round_end(room: &mut Room) {
    if room.round_buzzed {
        return;
    }
    let Some(saboteur_id) = room.saboteur_id.clone() else {
        return;
    };
    if let Some(player) = room.player_mut(&saboteur_id) {
        player.score = player.score.saturating_add(UNCHALLENGED_SABOTEUR_POINTS);
        debug!(player_id = %saboteur_id, score = player.score, "Saboteur went unchallenged");
    }
}

/// Zeroes every score
pub fn reset_scores(room: &mut Room) {
    for player in &mut room.players {
        player.score = 0;
    }
}
