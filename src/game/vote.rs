use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::errors::GameError;
use super::round::{finish_game, pause_timer, resume_timer};
use super::win;
use crate::room::{AccusationVote, Ballot, PlayerId, Room, Winner};

/// What a voter chose
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteTarget {
    Player(PlayerId),
    Skip,
}

impl VoteTarget {
    /// `"skip"` abstains; anything else names a player
    pub fn parse(raw: &str) -> Self {
        if raw == "skip" {
            VoteTarget::Skip
        } else {
            VoteTarget::Player(raw.to_string())
        }
    }
}

/// Opens an accusation vote and pauses the round clock.
/// Returns the new vote's id.
pub fn open_vote(
    room: &mut Room,
    accuser_id: &str,
    duration: Duration,
    now: Instant,
) -> Result<u64, GameError> {
    if !room.is_round_live() {
        return Err(GameError::NotPlaying);
    }
    let accuser = room.player(accuser_id).ok_or(GameError::NotInRoom)?;
    if accuser.disabled {
        return Err(GameError::PlayerDisabled);
    }
    if room.active_vote.is_some() {
        return Err(GameError::VoteInProgress);
    }
    let initiator_name = accuser.name.clone();

    pause_timer(room, now);

    let id = room.next_vote_id;
    room.next_vote_id += 1;
    room.accused_player_id = Some(accuser_id.to_string());
    room.round_buzzed = true;
    room.active_vote = Some(AccusationVote {
        id,
        initiator_id: accuser_id.to_string(),
        initiator_name,
        ballots: Vec::new(),
        skips: Vec::new(),
        started_at: now,
        started_at_utc: Utc::now(),
        duration,
    });

    info!(room_code = %room.code, accuser_id = %accuser_id, vote_id = id, "Accusation vote opened");
    Ok(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CastReceipt {
    /// Every enabled player has voted or skipped
    pub all_resolved: bool,
}

/// Records one ballot or skip. A rejected call leaves the vote untouched.
pub fn cast_vote(
    room: &mut Room,
    voter_id: &str,
    target: VoteTarget,
) -> Result<CastReceipt, GameError> {
    let vote = room.active_vote.as_ref().ok_or(GameError::NoActiveVote)?;
    let voter = room.player(voter_id).ok_or(GameError::NotInRoom)?;
    if voter.disabled {
        return Err(GameError::VoterDisabled);
    }
    if vote.has_responded(voter_id) {
        return Err(GameError::AlreadyVoted);
    }
    if let VoteTarget::Player(target_id) = &target {
        let target = room.player(target_id).ok_or(GameError::TargetNotFound)?;
        if target.disabled {
            return Err(GameError::TargetDisabled);
        }
        if target_id == voter_id {
            return Err(GameError::SelfVote);
        }
    }

    let eligible = room.enabled_count();
    let Some(vote) = room.active_vote.as_mut() else {
        return Err(GameError::NoActiveVote);
    };
    match target {
        VoteTarget::Skip => vote.skips.push(voter_id.to_string()),
        VoteTarget::Player(target_id) => vote.ballots.push(Ballot {
            voter_id: voter_id.to_string(),
            target_id,
        }),
    }

    let all_resolved = vote.response_count() >= eligible;
    debug!(
        room_code = %room.code,
        voter_id = %voter_id,
        responses = vote.response_count(),
        eligible,
        all_resolved,
        "Vote recorded"
    );
    Ok(CastReceipt { all_resolved })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteCount {
    pub player_id: PlayerId,
    pub votes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    /// Set only on a clear majority
    pub kicked_player_id: Option<PlayerId>,
    pub kicked_player_name: Option<String>,
    pub max_votes: usize,
    pub second_max_votes: usize,
    pub has_clear_majority: bool,
    /// Per target, in the order targets first received a vote
    pub vote_counts: Vec<VoteCount>,
    pub voted_count: usize,
    pub skip_count: usize,
    pub eligible_count: usize,
    pub saboteur_voted_out: bool,
}

/// Counts ballots between enabled players. The top target is kicked only
/// when its count is at least one and strictly above every other target.
pub fn tally(room: &Room, vote: &AccusationVote) -> VoteTally {
    let is_enabled = |id: &str| room.player(id).is_some_and(|p| !p.disabled);

    let mut vote_counts: Vec<VoteCount> = Vec::new();
    for ballot in vote
        .ballots
        .iter()
        .filter(|b| is_enabled(&b.voter_id) && is_enabled(&b.target_id))
    {
        match vote_counts.iter_mut().find(|c| c.player_id == ballot.target_id) {
            Some(count) => count.votes += 1,
            None => vote_counts.push(VoteCount {
                player_id: ballot.target_id.clone(),
                votes: 1,
            }),
        }
    }

    let mut ranked: Vec<&VoteCount> = vote_counts.iter().collect();
    ranked.sort_by(|a, b| b.votes.cmp(&a.votes));
    let max_votes = ranked.first().map_or(0, |c| c.votes);
    let second_max_votes = ranked.get(1).map_or(0, |c| c.votes);
    let has_clear_majority = max_votes > 0 && max_votes > second_max_votes;

    let kicked_player_id = ranked
        .first()
        .filter(|_| has_clear_majority)
        .map(|c| c.player_id.clone());
    let kicked_player_name = kicked_player_id.as_deref().and_then(|id| room.player_name(id));
    let saboteur_voted_out =
        kicked_player_id.is_some() && kicked_player_id == room.saboteur_id;

    VoteTally {
        kicked_player_id,
        kicked_player_name,
        max_votes,
        second_max_votes,
        has_clear_majority,
        vote_counts,
        voted_count: vote.ballots.len(),
        skip_count: vote.skips.len(),
        eligible_count: room.enabled_count(),
        saboteur_voted_out,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoteOutcome {
    /// Round clock resumed, further accusations allowed
    Continue,
    GameOver { winner: Winner, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteResolution {
    pub tally: VoteTally,
    /// Player disabled by this vote
    pub disabled: Option<PlayerId>,
    pub outcome: VoteOutcome,
}

/// Closes the open vote and applies its result.
///
/// The vote is taken out of the room before anything else happens, so a
/// second caller finds nothing to resolve and gets `None`.
pub fn resolve_vote(room: &mut Room, now: Instant) -> Option<VoteResolution> {
    let vote = room.active_vote.take()?;
    room.accused_player_id = None;

    let tally = tally(room, &vote);

    let disabled = tally.kicked_player_id.clone().filter(|id| {
        room.player_mut(id)
            .map(|player| player.disabled = true)
            .is_some()
    });

    let outcome = if tally.saboteur_voted_out {
        VoteOutcome::GameOver {
            winner: Winner::Fixers,
            reason: win::SABOTEUR_VOTED_OUT.to_string(),
        }
    } else if disabled.is_some() && win::saboteur_wins(room) {
        VoteOutcome::GameOver {
            winner: Winner::Saboteur,
            reason: win::FIXERS_ELIMINATED.to_string(),
        }
    } else {
        VoteOutcome::Continue
    };

    match &outcome {
        VoteOutcome::GameOver { winner, reason } => finish_game(room, *winner, reason.clone()),
        VoteOutcome::Continue => resume_timer(room, now),
    }

    info!(
        room_code = %room.code,
        vote_id = vote.id,
        kicked = ?tally.kicked_player_id,
        max_votes = tally.max_votes,
        skips = tally.skip_count,
        "Accusation vote resolved"
    );

    Some(VoteResolution {
        tally,
        disabled,
        outcome,
    })
}

/// Drops the open vote without counting it and resumes the round clock
pub fn cancel_vote(room: &mut Room, now: Instant) -> bool {
    let Some(vote) = room.active_vote.take() else {
        return false;
    };
    room.accused_player_id = None;
    resume_timer(room, now);
    info!(room_code = %room.code, vote_id = vote.id, "Accusation vote cancelled");
    true
}
