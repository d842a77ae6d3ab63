//! Rooms and the room registry.

pub mod registry;
pub mod room;

pub use registry::RoomRegistry;
pub use room::Room;
