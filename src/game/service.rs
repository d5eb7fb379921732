use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, instrument, warn};

use super::challenges::ChallengeCatalog;
use super::errors::GameError;
use super::round::{self, RoundOutcome};
use super::scoring;
use super::vote::{self, CastReceipt, VoteOutcome, VoteTarget};
use super::win;
use crate::collab::{validate_submission, DocumentService, TestResult, TestRunner, TestSuite};
use crate::config::GameConfig;
use crate::event::{GameEvent, RoomBroadcaster};
use crate::room::timer::{TimerHandle, TimerId};
use crate::room::{Phase, PlayerId, Room, RoomGuard, RoomSnapshot, RoomStore, VoteSnapshot, Winner};
use crate::session::{
    generate_player_id, generate_room_code, normalize_room_code, validate_player_name,
    ConnectionId, SessionBinding, SessionRegistry,
};

pub const NO_CLEAR_MAJORITY: &str = "No clear majority - game continues";
pub const PLAYER_DISCONNECTED: &str = "A player disconnected";
pub const SYSTEM_USERNAME: &str = "System";
pub const MAX_CHAT_LEN: usize = 500;

const MAX_ROOM_CODE_ATTEMPTS: usize = 16;
const TICK: Duration = Duration::from_secs(1);

/// What a player gets back after creating or joining a room
#[derive(Debug, Clone, Serialize)]
pub struct JoinedRoom {
    pub room_code: String,
    pub player_id: PlayerId,
    pub room: RoomSnapshot,
}

/// Verdict on a submitted fix, returned to the submitter
#[derive(Debug, Clone, Serialize)]
pub struct FixReport {
    pub passed: bool,
    pub passed_count: usize,
    pub total_count: usize,
    pub results: Vec<TestResult>,
    /// False when the round moved on while the fix was being checked
    pub applied: bool,
}

/// The parts of a round a submission is judged against
struct PinnedRound {
    serial: u64,
    suite: TestSuite,
    correct_code: String,
    bug_description: String,
    player_name: String,
}

/// Runs every player request and every room timer.
///
/// All room mutation happens while holding that room's lock, and every
/// broadcast about a mutation is sent before the lock is released, so each
/// room sees its events in the order they were applied.
pub struct GameService {
    store: RoomStore,
    sessions: Arc<dyn SessionRegistry>,
    broadcaster: Arc<dyn RoomBroadcaster>,
    documents: Arc<dyn DocumentService>,
    runner: Arc<dyn TestRunner>,
    catalog: Arc<ChallengeCatalog>,
    config: GameConfig,
}

impl GameService {
    pub fn new(
        store: RoomStore,
        sessions: Arc<dyn SessionRegistry>,
        broadcaster: Arc<dyn RoomBroadcaster>,
        documents: Arc<dyn DocumentService>,
        runner: Arc<dyn TestRunner>,
        catalog: Arc<ChallengeCatalog>,
        config: GameConfig,
    ) -> Self {
        Self {
            store,
            sessions,
            broadcaster,
            documents,
            runner,
            catalog,
            config,
        }
    }

    pub fn store(&self) -> &RoomStore {
        &self.store
    }

    pub fn sessions(&self) -> &Arc<dyn SessionRegistry> {
        &self.sessions
    }

    /// Current state of a room, as players see it
    pub async fn room_snapshot(&self, code: &str) -> Result<RoomSnapshot, GameError> {
        let room = self.store.lock_room(&normalize_room_code(code)).await?;
        Ok(room.snapshot())
    }

    async fn lock_bound(
        &self,
        connection: ConnectionId,
    ) -> Result<(SessionBinding, RoomGuard), GameError> {
        let binding = self
            .sessions
            .resolve(connection)
            .await
            .ok_or(GameError::NotConnected)?;
        let room = self.store.lock_room(&binding.room_code).await?;
        if !room.has_player(&binding.player_id) {
            return Err(GameError::NotInRoom);
        }
        Ok((binding, room))
    }

    async fn emit_room_updated(&self, room: &Room) {
        self.broadcaster
            .emit_to_room(&room.code, GameEvent::RoomUpdated { room: room.snapshot() })
            .await;
    }

    // ---- Lobby ----

    /// Creates a room with a fresh code and makes the caller its host
    #[instrument(skip(self))]
    pub async fn create_room(
        self: &Arc<Self>,
        connection: ConnectionId,
        player_name: &str,
    ) -> Result<JoinedRoom, GameError> {
        let name = validate_player_name(player_name)?;
        let player_id = generate_player_id();
        let room = self.create_with_fresh_code(&player_id, name).await?;

        let joined = JoinedRoom {
            room_code: room.code.clone(),
            player_id: player_id.clone(),
            room: room.snapshot(),
        };
        let previous = self
            .sessions
            .bind(
                connection,
                SessionBinding {
                    player_id,
                    room_code: joined.room_code.clone(),
                },
            )
            .await;
        self.emit_room_updated(&room).await;
        drop(room);

        if let Some(previous) = previous {
            self.depart(&previous).await;
        }
        Ok(joined)
    }

    async fn create_with_fresh_code(
        &self,
        player_id: &str,
        name: String,
    ) -> Result<RoomGuard, GameError> {
        let mut last_code = String::new();
        for _ in 0..MAX_ROOM_CODE_ATTEMPTS {
            let code = generate_room_code();
            match self
                .store
                .create_room(&code, player_id.to_string(), name.clone())
                .await
            {
                Ok(room) => return Ok(room),
                Err(GameError::RoomCodeTaken(taken)) => {
                    debug!(room_code = %taken, "Room code collision, retrying");
                    last_code = taken;
                }
                Err(e) => return Err(e),
            }
        }
        warn!("Could not find a free room code");
        Err(GameError::RoomCodeTaken(last_code))
    }

    #[instrument(skip(self))]
    pub async fn join_room(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
        player_name: &str,
    ) -> Result<JoinedRoom, GameError> {
        let name = validate_player_name(player_name)?;
        let code = normalize_room_code(room_code);
        let player_id = generate_player_id();
        let room = self
            .store
            .add_player(&code, player_id.clone(), name.clone())
            .await?;

        let joined = JoinedRoom {
            room_code: code.clone(),
            player_id: player_id.clone(),
            room: room.snapshot(),
        };
        let previous = self
            .sessions
            .bind(
                connection,
                SessionBinding {
                    player_id: player_id.clone(),
                    room_code: code.clone(),
                },
            )
            .await;

        self.broadcaster
            .emit_to_others(
                connection,
                &code,
                GameEvent::PlayerJoined {
                    player_id,
                    player_name: name.clone(),
                    room: joined.room.clone(),
                },
            )
            .await;
        self.broadcaster
            .emit_to_others(connection, &code, system_chat(format!("{name} joined the room")))
            .await;
        self.emit_room_updated(&room).await;
        drop(room);

        if let Some(previous) = previous {
            self.depart(&previous).await;
        }
        Ok(joined)
    }

    /// Toggles the caller's ready flag
    #[instrument(skip(self))]
    pub async fn set_ready(&self, connection: ConnectionId) -> Result<RoomSnapshot, GameError> {
        let (binding, mut room) = self.lock_bound(connection).await?;
        if room.phase != Phase::Lobby {
            return Err(GameError::NotInLobby);
        }
        let player = room
            .player_mut(&binding.player_id)
            .ok_or(GameError::NotInRoom)?;
        player.is_ready = !player.is_ready;
        debug!(
            room_code = %binding.room_code,
            player_id = %binding.player_id,
            ready = player.is_ready,
            "Ready toggled"
        );

        self.emit_room_updated(&room).await;
        Ok(room.snapshot())
    }

    // ---- Rounds ----

    /// Host-only. Assigns roles, installs the first round and starts its clock.
    #[instrument(skip(self))]
    pub async fn start_game(
        self: &Arc<Self>,
        connection: ConnectionId,
    ) -> Result<RoomSnapshot, GameError> {
        let (binding, mut room) = self.lock_bound(connection).await?;
        if !room.is_host(&binding.player_id) {
            return Err(GameError::NotHost);
        }
        let artifact = self
            .catalog
            .pick(&mut rand::rng())
            .ok_or(GameError::NoChallenges)?;
        round::start_game(
            &mut room,
            artifact,
            self.config.min_players,
            &mut rand::rng(),
            Instant::now(),
        )?;

        self.publish_document(&room).await;
        let snapshot = room.snapshot();
        self.broadcaster
            .emit_to_room(&room.code, GameEvent::GameStarted { room: snapshot.clone() })
            .await;
        self.broadcaster
            .emit_to_room(&room.code, GameEvent::RoundStarted { room: snapshot.clone() })
            .await;
        self.arm_round_clock(&mut room);
        Ok(snapshot)
    }

    /// Resets the shared document to the round's buggy starting code
    async fn publish_document(&self, room: &Room) {
        if let Some(artifact) = &room.artifact {
            self.documents
                .reset_document(&room.code, &artifact.starting_code)
                .await;
        }
    }

    fn arm_round_clock(self: &Arc<Self>, room: &mut Room) {
        let id = TimerId::next();
        let task = self
            .clone()
            .run_round_clock(room.code.clone(), id, room.round_serial);
        room.timers.round_clock.arm(id, TimerHandle::spawn(task));
    }

    /// 1 Hz round countdown. Ends the round once it runs out; stops on its own
    /// when the room goes away or moves on to another round.
    fn run_round_clock(self: Arc<Self>, code: String, id: TimerId, serial: u64) -> BoxFuture<'static, ()> {
        async move {
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            loop {
                ticker.tick().await;
                let Ok(mut room) = self.store.lock_room(&code).await else {
                    return;
                };
                if !room.timers.round_clock.owns(id)
                    || room.round_serial != serial
                    || room.phase != Phase::Playing
                {
                    return;
                }
                if room.timer_paused {
                    continue;
                }
                let Some(remaining) = round::remaining_secs(&room, Instant::now()) else {
                    return;
                };

                self.broadcaster
                    .emit_to_room(&code, GameEvent::TimerUpdate { remaining: remaining.max(0) })
                    .await;

                if remaining <= 0 {
                    if room.timers.round_clock.claim(id) {
                        info!(room_code = %code, "Round time is up");
                        self.finish_round(&mut room, None).await;
                    }
                    return;
                }
            }
        }
        .boxed()
    }

    /// Judges the round's final code and either ends the game or schedules
    /// the next round. `submitted` is a passing fix, if there was one.
    async fn finish_round(self: &Arc<Self>, room: &mut Room, submitted: Option<String>) {
        room.timers.cancel_game_timers();

        let final_text = match submitted {
            Some(code) => code,
            None => match self.documents.get_document_text(&room.code).await {
                Some(text) => text,
                None => room
                    .artifact
                    .as_ref()
                    .map(|artifact| artifact.last_known_text.clone())
                    .unwrap_or_default(),
            },
        };

        let end = round::end_round(room, &final_text, &mut rand::rng());
        self.broadcaster
            .emit_to_room(
                &room.code,
                GameEvent::RoundEnded {
                    summary: end.summary,
                    room: room.snapshot(),
                },
            )
            .await;

        match end.outcome {
            RoundOutcome::GameOver { winner, reason } => {
                self.announce_game_over(room, winner, reason).await;
            }
            RoundOutcome::NextRound => self.schedule_next_round(room),
        }
    }

    fn schedule_next_round(self: &Arc<Self>, room: &mut Room) {
        let id = TimerId::next();
        let delay = self.config.round_interstitial();
        debug!(room_code = %room.code, delay_secs = delay.as_secs(), "Next round scheduled");
        let task = self
            .clone()
            .run_next_round(room.code.clone(), id, room.round_serial, delay);
        room.timers.round_transition.arm(id, TimerHandle::spawn(task));
    }

    fn run_next_round(
        self: Arc<Self>,
        code: String,
        id: TimerId,
        serial: u64,
        delay: Duration,
    ) -> BoxFuture<'static, ()> {
        async move {
            tokio::time::sleep(delay).await;
            let Ok(mut room) = self.store.lock_room(&code).await else {
                return;
            };
            if !room.timers.round_transition.claim(id)
                || room.phase != Phase::Playing
                || room.round_serial != serial
            {
                return;
            }
            self.begin_round(&mut room).await;
        }
        .boxed()
    }

    async fn begin_round(self: &Arc<Self>, room: &mut Room) {
        let Some(artifact) = self.catalog.pick(&mut rand::rng()) else {
            error!(room_code = %room.code, "No challenge available for the next round");
            return;
        };
        round::start_round(room, artifact, Instant::now());
        self.publish_document(room).await;
        info!(room_code = %room.code, round = room.current_round, "Round started");

        self.broadcaster
            .emit_to_room(&room.code, GameEvent::RoundStarted { room: room.snapshot() })
            .await;
        self.arm_round_clock(room);
    }

    /// Stops every game timer and tells the room who won
    async fn announce_game_over(&self, room: &mut Room, winner: Winner, reason: String) {
        room.timers.cancel_game_timers();
        self.broadcaster
            .emit_to_room(
                &room.code,
                GameEvent::GameEnded {
                    winner,
                    reason,
                    room: room.snapshot(),
                },
            )
            .await;
    }

    /// Returns a finished game to the lobby. Any player may ask.
    #[instrument(skip(self))]
    pub async fn play_again(&self, connection: ConnectionId) -> Result<RoomSnapshot, GameError> {
        let (_, mut room) = self.lock_bound(connection).await?;
        round::reset_game(&mut room)?;
        room.timers.cancel_game_timers();
        info!(room_code = %room.code, "Room returned to lobby");

        let snapshot = room.snapshot();
        self.broadcaster
            .emit_to_room(&room.code, GameEvent::GameReset { room: snapshot.clone() })
            .await;
        Ok(snapshot)
    }

    // ---- Accusations ----

    /// Opens an accusation vote and pauses the round clock
    #[instrument(skip(self))]
    pub async fn accuse(self: &Arc<Self>, connection: ConnectionId) -> Result<VoteSnapshot, GameError> {
        let (binding, mut room) = self.lock_bound(connection).await?;
        let now = Instant::now();
        let vote_id = vote::open_vote(
            &mut room,
            &binding.player_id,
            self.config.vote_duration(),
            now,
        )?;
        let Some(vote) = room.active_vote.as_ref().map(|vote| vote.snapshot(now)) else {
            return Err(GameError::NoActiveVote);
        };

        let id = TimerId::next();
        let task = self.clone().run_vote_clock(room.code.clone(), id, vote_id);
        room.timers.vote_clock.arm(id, TimerHandle::spawn(task));

        self.broadcaster
            .emit_to_room(
                &room.code,
                GameEvent::PlayerBuzzed {
                    player_id: binding.player_id.clone(),
                    player_name: vote.initiator_name.clone(),
                    vote: vote.clone(),
                },
            )
            .await;
        self.emit_room_updated(&room).await;
        Ok(vote)
    }

    /// 1 Hz vote countdown. Resolves the vote when it reaches zero unless
    /// every player answered first.
    fn run_vote_clock(self: Arc<Self>, code: String, id: TimerId, vote_id: u64) -> BoxFuture<'static, ()> {
        async move {
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            loop {
                ticker.tick().await;
                let Ok(mut room) = self.store.lock_room(&code).await else {
                    return;
                };
                if !room.timers.vote_clock.owns(id) {
                    return;
                }
                let remaining = match room.active_vote.as_ref() {
                    Some(vote) if vote.id == vote_id => vote.remaining_secs(Instant::now()),
                    _ => return,
                };

                self.broadcaster
                    .emit_to_room(&code, GameEvent::VoteTimeUpdate { remaining })
                    .await;

                if remaining == 0 {
                    if room.timers.vote_clock.claim(id) {
                        info!(room_code = %code, vote_id, "Vote time is up");
                        self.conclude_vote(&mut room).await;
                    }
                    return;
                }
            }
        }
        .boxed()
    }

    /// Records the caller's ballot (a player id) or `"skip"`
    #[instrument(skip(self))]
    pub async fn cast_vote(
        self: &Arc<Self>,
        connection: ConnectionId,
        target: &str,
    ) -> Result<CastReceipt, GameError> {
        let (binding, mut room) = self.lock_bound(connection).await?;
        let receipt = vote::cast_vote(&mut room, &binding.player_id, VoteTarget::parse(target))?;

        if let Some(vote) = room.active_vote.as_ref().map(|v| v.snapshot(Instant::now())) {
            self.broadcaster
                .emit_to_room(&room.code, GameEvent::VoteUpdated { vote })
                .await;
        }

        if receipt.all_resolved {
            // Cancelling before resolving keeps the countdown from resolving again
            room.timers.vote_clock.cancel();
            self.conclude_vote(&mut room).await;
        }
        Ok(receipt)
    }

    async fn conclude_vote(self: &Arc<Self>, room: &mut Room) {
        let Some(resolution) = vote::resolve_vote(room, Instant::now()) else {
            return;
        };

        let reason = (!resolution.tally.has_clear_majority).then(|| NO_CLEAR_MAJORITY.to_string());
        self.broadcaster
            .emit_to_room(
                &room.code,
                GameEvent::VoteEnded {
                    tally: resolution.tally.clone(),
                    reason,
                },
            )
            .await;

        if let Some(disabled) = &resolution.disabled {
            let player_name = room.player_name(disabled).unwrap_or_default();
            self.broadcaster
                .emit_to_room(
                    &room.code,
                    GameEvent::PlayerDisabled {
                        player_id: disabled.clone(),
                        player_name,
                        room: room.snapshot(),
                    },
                )
                .await;
        }

        match resolution.outcome {
            VoteOutcome::GameOver { winner, reason } => {
                self.announce_game_over(room, winner, reason).await;
            }
            VoteOutcome::Continue => self.emit_room_updated(room).await,
        }
    }

    // ---- Code ----

    /// Replaces the round's shared document with the caller's text
    #[instrument(skip(self, code))]
    pub async fn update_code(&self, connection: ConnectionId, code: &str) -> Result<(), GameError> {
        let (binding, mut room) = self.lock_bound(connection).await?;
        if !room.is_round_live() {
            return Err(GameError::NotPlaying);
        }
        if room
            .player(&binding.player_id)
            .is_some_and(|player| player.disabled)
        {
            return Err(GameError::PlayerDisabled);
        }

        self.documents.reset_document(&room.code, code).await;
        if let Some(artifact) = room.artifact.as_mut() {
            artifact.last_known_text = code.to_string();
        }

        self.broadcaster
            .emit_to_others(
                connection,
                &room.code,
                GameEvent::CodeUpdated {
                    player_id: binding.player_id,
                    code: code.to_string(),
                },
            )
            .await;
        Ok(())
    }

    /// Checks a fix against the round's tests. A passing fix ends the round
    /// after a short delay with the submitted code as its final text.
    #[instrument(skip(self, code))]
    pub async fn submit_fix(
        self: &Arc<Self>,
        connection: ConnectionId,
        code: &str,
    ) -> Result<FixReport, GameError> {
        let (binding, pinned) = {
            let (binding, room) = self.lock_bound(connection).await?;
            let pinned = pin_round(&room, &binding.player_id)?;
            (binding, pinned)
        };

        let report = validate_submission(
            self.runner.as_ref(),
            code,
            &pinned.suite,
            self.config.validation_timeout(),
        )
        .await?;

        let mut room = self.store.lock_room(&binding.room_code).await?;
        let still_current = room.round_serial == pinned.serial
            && room.is_round_live()
            && room.active_vote.is_none()
            && room
                .player(&binding.player_id)
                .is_some_and(|player| !player.disabled);

        let mut fix = FixReport {
            passed: report.all_passed,
            passed_count: report.passed_count(),
            total_count: report.total_count(),
            results: report.results,
            applied: false,
        };
        if !still_current {
            debug!(room_code = %room.code, "Round moved on during validation, fix not applied");
            return Ok(fix);
        }
        fix.applied = true;
        scoring::score_fix(&mut room, &binding.player_id, fix.passed);

        info!(
            room_code = %room.code,
            player_id = %binding.player_id,
            passed = fix.passed,
            "Fix submitted"
        );
        self.broadcaster
            .emit_to_room(
                &room.code,
                GameEvent::FixSubmitted {
                    player_id: binding.player_id.clone(),
                    player_name: pinned.player_name,
                    passed: fix.passed,
                    passed_count: fix.passed_count,
                    total_count: fix.total_count,
                    correct_code: fix.passed.then_some(pinned.correct_code),
                    bug_description: fix.passed.then_some(pinned.bug_description),
                },
            )
            .await;

        if fix.passed {
            room.timers.round_clock.cancel();
            round::freeze_round(&mut room);

            let id = TimerId::next();
            let task = self.clone().run_fixed_round_end(
                room.code.clone(),
                id,
                pinned.serial,
                code.to_string(),
                self.config.fix_result_delay(),
            );
            room.timers.round_transition.arm(id, TimerHandle::spawn(task));
        }
        Ok(fix)
    }

    fn run_fixed_round_end(
        self: Arc<Self>,
        code: String,
        id: TimerId,
        serial: u64,
        final_text: String,
        delay: Duration,
    ) -> BoxFuture<'static, ()> {
        async move {
            tokio::time::sleep(delay).await;
            let Ok(mut room) = self.store.lock_room(&code).await else {
                return;
            };
            if !room.timers.round_transition.claim(id)
                || room.phase != Phase::Playing
                || room.round_serial != serial
            {
                return;
            }
            self.finish_round(&mut room, Some(final_text)).await;
        }
        .boxed()
    }

    // ---- Chat ----

    /// Sends a line of chat to everyone in the caller's room
    #[instrument(skip(self, message))]
    pub async fn send_chat(&self, connection: ConnectionId, message: &str) -> Result<(), GameError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(GameError::EmptyMessage);
        }
        if message.chars().count() > MAX_CHAT_LEN {
            return Err(GameError::MessageTooLong { max: MAX_CHAT_LEN });
        }

        let (binding, room) = self.lock_bound(connection).await?;
        let username = room.player_name(&binding.player_id).ok_or(GameError::NotInRoom)?;
        debug!(room_code = %room.code, player_id = %binding.player_id, "Chat message");

        self.broadcaster
            .emit_to_room(
                &room.code,
                GameEvent::ChatMessage {
                    player_id: Some(binding.player_id),
                    username,
                    message: message.to_string(),
                    system: false,
                },
            )
            .await;
        Ok(())
    }

    // ---- Departures ----

    /// Leaves the caller's room on request
    #[instrument(skip(self))]
    pub async fn leave(self: &Arc<Self>, connection: ConnectionId) -> Result<(), GameError> {
        let binding = self
            .sessions
            .unbind(connection)
            .await
            .ok_or(GameError::NotConnected)?;
        self.depart(&binding).await;
        Ok(())
    }

    /// Runs when a socket closes. Not an error if it was never in a room.
    #[instrument(skip(self))]
    pub async fn player_disconnected(self: &Arc<Self>, connection: ConnectionId) {
        if let Some(binding) = self.sessions.unbind(connection).await {
            self.depart(&binding).await;
        }
    }

    /// Removes a player from their room. An open vote is cancelled rather than
    /// resolved, and the game ends if the departure decides it.
    async fn depart(self: &Arc<Self>, binding: &SessionBinding) {
        let Ok(mut room) = self.store.lock_room(&binding.room_code).await else {
            return;
        };
        if !room.has_player(&binding.player_id) {
            return;
        }

        if vote::cancel_vote(&mut room, Instant::now()) {
            room.timers.vote_clock.cancel();
            self.broadcaster
                .emit_to_room(
                    &room.code,
                    GameEvent::VoteCancelled {
                        reason: PLAYER_DISCONNECTED.to_string(),
                        room: room.snapshot(),
                    },
                )
                .await;
        }

        let was_saboteur = room.saboteur_id.as_deref() == Some(binding.player_id.as_str());
        let Some(departed) = self.store.remove_player(&mut room, &binding.player_id) else {
            return;
        };

        let game_over = if room.players.is_empty() {
            // Whoever rejoins within the grace period starts from the lobby
            if room.phase != Phase::Lobby {
                room.timers.cancel_game_timers();
                round::return_to_lobby(&mut room);
            }
            None
        } else if room.phase != Phase::Playing {
            None
        } else if was_saboteur {
            Some((Winner::Fixers, win::SABOTEUR_LEFT.to_string()))
        } else if win::saboteur_wins(&room) {
            Some((Winner::Saboteur, win::FIXERS_ELIMINATED.to_string()))
        } else {
            None
        };

        if let Some((winner, reason)) = &game_over {
            round::finish_game(&mut room, *winner, reason.clone());
        }

        self.broadcaster
            .emit_to_room(
                &room.code,
                GameEvent::PlayerLeft {
                    player_id: binding.player_id.clone(),
                    room: room.snapshot(),
                },
            )
            .await;
        self.broadcaster
            .emit_to_room(&room.code, system_chat(format!("{} left the game", departed.name)))
            .await;

        if let Some((winner, reason)) = game_over {
            self.announce_game_over(&mut room, winner, reason).await;
        }
    }
}

fn system_chat(message: String) -> GameEvent {
    GameEvent::ChatMessage {
        player_id: None,
        username: SYSTEM_USERNAME.to_string(),
        message,
        system: true,
    }
}

/// Snapshot of what a submission is judged against, taken under the room lock
fn pin_round(room: &Room, player_id: &str) -> Result<PinnedRound, GameError> {
    if !room.is_round_live() {
        return Err(GameError::NotPlaying);
    }
    if room.active_vote.is_some() {
        return Err(GameError::VoteInProgress);
    }
    let player = room.player(player_id).ok_or(GameError::NotInRoom)?;
    if player.disabled {
        return Err(GameError::PlayerDisabled);
    }
    let artifact = room.artifact.as_ref().ok_or(GameError::NotPlaying)?;

    Ok(PinnedRound {
        serial: room.round_serial,
        suite: artifact.test_suite(),
        correct_code: artifact.correct_code.clone(),
        bug_description: artifact.bug_description.clone(),
        player_name: player.name.clone(),
    })
}
