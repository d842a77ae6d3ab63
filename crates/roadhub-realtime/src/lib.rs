//! # roadhub-realtime
//!
//! Room-based real-time fan-out for the dispatch engine:
//!
//! - WebSocket connection pool with per-user indexing
//! - Room registry keyed by job/queue/route identity
//! - Join snapshots so late subscribers never miss context
//! - At-most-once, best-effort delivery (no store-and-forward)
//!
//! The room registry is process-local and rebuilt from client join events
//! after a restart; it holds no durable state.

pub mod connection;
pub mod hub;
pub mod message;
pub mod room;

pub use hub::RealtimeHub;
pub use room::registry::RoomRegistry;
