// Public API
pub use cleanup_task::start_cleanup_task;
pub use handlers::{get_room, list_rooms};
pub use models::{
    AccusationVote, Ballot, KnownBug, Phase, Player, PlayerId, Role, Room, RoundArtifact,
    RoundSummary, Winner,
};
pub use repository::{RoomGuard, RoomHandle, RoomStore};
pub use types::{ArtifactSnapshot, PlayerSnapshot, RoomSnapshot, VoteSnapshot};

// Internal modules
mod cleanup_task;
mod handlers;
pub mod models;
pub mod repository;
pub mod timer;
mod types;
