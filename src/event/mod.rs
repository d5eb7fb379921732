// Room events and the capability used to announce them

// Public API - what other modules can use
pub use broadcaster::RoomBroadcaster;
pub use events::GameEvent;

// Internal modules
mod broadcaster;
mod events;
