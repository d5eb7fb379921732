use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::room::{Role, Room};

/// Shuffles every player in the room and makes the first one saboteur.
/// Players ejected earlier in the game stay fixers.
///
/// Called at game start and again at every round rotation. Does nothing on
/// an empty room.
pub fn assign_roles<R: Rng + ?Sized>(room: &mut Room, rng: &mut R) {
    let mut players: Vec<(String, bool)> = room
        .players
        .iter()
        .map(|p| (p.id.clone(), p.disabled))
        .collect();
    players.shuffle(rng);
    // Stable, so enabled players keep their shuffled order
    players.sort_by_key(|(_, disabled)| *disabled);
    let ids: Vec<String> = players.into_iter().map(|(id, _)| id).collect();

    let Some((saboteur, fixers)) = ids.split_first() else {
        return;
    };

    for player in &mut room.players {
        player.role = Some(if player.id == *saboteur {
            Role::Saboteur
        } else {
            Role::Fixer
        });
    }
    room.saboteur_id = Some(saboteur.clone());
    room.fixer_ids = fixers.to_vec();

    debug!(room_code = %room.code, fixer_count = room.fixer_ids.len(), "Roles assigned");
}

/// Clears every role assignment
pub fn clear_roles(room: &mut Room) {
    for player in &mut room.players {
        player.role = None;
    }
    room.saboteur_id = None;
    room.fixer_ids.clear();
}
