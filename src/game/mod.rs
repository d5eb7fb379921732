// Public API
pub use challenges::{BugVariant, Challenge, ChallengeCatalog};
pub use errors::{ErrorKind, GameError};
pub use service::{
    FixReport, GameService, JoinedRoom, MAX_CHAT_LEN, NO_CLEAR_MAJORITY, PLAYER_DISCONNECTED,
    SYSTEM_USERNAME,
};
pub use vote::{CastReceipt, VoteCount, VoteTally, VoteTarget};

// Game rules, usable on a bare `Room`
pub mod challenges;
pub mod roles;
pub mod round;
pub mod scoring;
pub mod vote;
pub mod win;

// Internal modules
mod errors;
mod service;
