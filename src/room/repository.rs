use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::models::{Phase, Player, PlayerId, Room};
use super::timer::{TimerHandle, TimerId};
use crate::collab::DocumentService;
use crate::config::{GameConfig, RoomsConfig};
use crate::game::GameError;

pub type RoomHandle = Arc<Mutex<Room>>;

/// Exclusive access to one room for the duration of one event
pub type RoomGuard = OwnedMutexGuard<Room>;

struct StoreInner {
    rooms: RwLock<HashMap<String, RoomHandle>>,
    documents: Arc<dyn DocumentService>,
    game: GameConfig,
    lifecycle: RoomsConfig,
}

/// In-memory registry of rooms keyed by room code.
///
/// Every room sits behind its own mutex; callers lock one room at a time and
/// finish their read-modify-write before releasing it. The map lock is never
/// held while waiting on a room lock.
#[derive(Clone)]
pub struct RoomStore {
    inner: Arc<StoreInner>,
}

impl RoomStore {
    pub fn new(game: GameConfig, lifecycle: RoomsConfig, documents: Arc<dyn DocumentService>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                rooms: RwLock::new(HashMap::new()),
                documents,
                game,
                lifecycle,
            }),
        }
    }

    /// Creates a room with `host_id` as its only player and host
    #[instrument(skip(self))]
    pub async fn create_room(
        &self,
        code: &str,
        host_id: PlayerId,
        host_name: String,
    ) -> Result<RoomGuard, GameError> {
        let mut rooms = self.inner.rooms.write().await;
        if rooms.contains_key(code) {
            warn!(room_code = %code, "Room code already in use");
            return Err(GameError::RoomCodeTaken(code.to_string()));
        }

        let mut room = Room::new(code.to_string(), &self.inner.game);
        room.add_player(host_id, host_name);

        let handle = Arc::new(Mutex::new(room));
        rooms.insert(code.to_string(), handle.clone());
        let guard = handle.lock_owned().await;

        info!(room_code = %code, room_count = rooms.len(), "Room created");
        Ok(guard)
    }

    pub async fn get_room(&self, code: &str) -> Option<RoomHandle> {
        let rooms = self.inner.rooms.read().await;
        rooms.get(code).cloned()
    }

    /// Locks a live room
    pub async fn lock_room(&self, code: &str) -> Result<RoomGuard, GameError> {
        let handle = self.get_room(code).await.ok_or(GameError::RoomNotFound)?;
        let room = handle.lock_owned().await;
        if room.closed {
            debug!(room_code = %code, "Room closed while waiting for lock");
            return Err(GameError::RoomNotFound);
        }
        Ok(room)
    }

    /// Adds a player to a lobby, cancelling any pending empty-room deletion
    #[instrument(skip(self))]
    pub async fn add_player(
        &self,
        code: &str,
        player_id: PlayerId,
        name: String,
    ) -> Result<RoomGuard, GameError> {
        let mut room = self.lock_room(code).await?;

        let max = self.inner.game.max_players;
        if room.players.len() >= max {
            debug!(room_code = %code, "Room is full");
            return Err(GameError::RoomFull { max });
        }
        if room.phase != Phase::Lobby {
            debug!(room_code = %code, phase = %room.phase, "Join rejected, game in progress");
            return Err(GameError::GameInProgress);
        }

        if room.empty_room_deadline.take().is_some() {
            info!(room_code = %code, "Player rejoined, cancelling room deletion");
        }
        room.timers.empty_room.cancel();

        room.add_player(player_id.clone(), name);
        info!(
            room_code = %code,
            player_id = %player_id,
            player_count = room.players.len(),
            "Player joined room"
        );
        Ok(room)
    }

    /// Removes a player from a locked room. An emptied room is kept for the
    /// reconnection grace period, then deleted.
    pub fn remove_player(&self, room: &mut Room, player_id: &str) -> Option<Player> {
        let removed = room.remove_player(player_id)?;
        info!(
            room_code = %room.code,
            player_id = %player_id,
            player_count = room.players.len(),
            host_id = ?room.host_id,
            "Player left room"
        );

        if room.players.is_empty() {
            self.schedule_empty_room_deletion(room);
        }
        Some(removed)
    }

    fn schedule_empty_room_deletion(&self, room: &mut Room) {
        let grace = self.inner.lifecycle.empty_room_grace();
        let code = room.code.clone();
        let store = self.clone();
        let id = TimerId::next();

        info!(room_code = %code, grace_secs = grace.as_secs(), "Room is empty, scheduling deletion");
        room.empty_room_deadline = Some(Instant::now() + grace);
        room.timers.empty_room.arm(
            id,
            TimerHandle::spawn(async move {
                tokio::time::sleep(grace).await;
                store.expire_empty_room(&code, id).await;
            }),
        );
    }

    async fn expire_empty_room(&self, code: &str, id: TimerId) {
        let Some(handle) = self.get_room(code).await else {
            return;
        };
        let mut room = handle.clone().lock_owned().await;
        if room.closed || !room.timers.empty_room.claim(id) {
            return;
        }
        if !room.players.is_empty() {
            return;
        }

        info!(room_code = %code, "Grace period over, deleting empty room");
        room.close();
        drop(room);
        self.evict(code, &handle).await;
    }

    /// Deletes a room outright, stopping its timers
    #[instrument(skip(self))]
    pub async fn delete_room(&self, code: &str) -> bool {
        let Some(handle) = self.get_room(code).await else {
            return false;
        };
        handle.lock().await.close();
        self.evict(code, &handle).await;
        info!(room_code = %code, "Room deleted");
        true
    }

    /// Deletes every room older than `ttl`, whatever its state
    #[instrument(skip(self))]
    pub async fn reap_idle_rooms(&self, ttl: Duration) -> Vec<String> {
        let handles: Vec<(String, RoomHandle)> = {
            let rooms = self.inner.rooms.read().await;
            rooms.iter().map(|(code, h)| (code.clone(), h.clone())).collect()
        };

        let now = Instant::now();
        let mut reaped = Vec::new();
        for (code, handle) in handles {
            {
                let mut room = handle.lock().await;
                if room.closed || now.saturating_duration_since(room.created_at) < ttl {
                    continue;
                }
                room.close();
            }
            self.evict(&code, &handle).await;
            debug!(room_code = %code, "Reaped idle room");
            reaped.push(code);
        }
        reaped
    }

    /// Removes the map entry if it still points at `handle`, then drops the document
    async fn evict(&self, code: &str, handle: &RoomHandle) {
        let removed = {
            let mut rooms = self.inner.rooms.write().await;
            match rooms.get(code) {
                Some(current) if Arc::ptr_eq(current, handle) => rooms.remove(code).is_some(),
                _ => false,
            }
        };
        if removed {
            self.inner.documents.dispose_document(code).await;
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn room_codes(&self) -> Vec<String> {
        self.inner.rooms.read().await.keys().cloned().collect()
    }

    /// Closes every room and cancels all timers
    pub async fn shutdown(&self) {
        let handles: Vec<(String, RoomHandle)> = {
            let mut rooms = self.inner.rooms.write().await;
            rooms.drain().collect()
        };

        info!(room_count = handles.len(), "Shutting down room store");
        for (code, handle) in handles {
            handle.lock().await.close();
            self.inner.documents.dispose_document(&code).await;
        }
    }
}
