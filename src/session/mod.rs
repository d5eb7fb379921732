// Public API - what other modules can use
pub use generators::{
    generate_player_id, generate_room_code, normalize_room_code, validate_player_name,
};
pub use registry::{ConnectionId, InMemorySessionRegistry, SessionBinding, SessionRegistry};

// Internal modules
mod generators;
mod registry;
