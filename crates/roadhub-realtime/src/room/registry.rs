//! Room registry — manages all rooms and their memberships.
//!
//! Process-local only: after a restart, the registry refills from client
//! join events. Empty rooms are dropped eagerly so the map tracks live
//! interest, not history.

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

use super::room::Room;

/// Registry of all active rooms.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Room name → Room.
    rooms: DashMap<String, Room>,
}

impl RoomRegistry {
    /// Creates a new room registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a connection to a room.
    pub fn join(&self, room_name: String, conn_id: ConnectionId) {
        self.rooms
            .entry(room_name.clone())
            .or_insert_with(|| Room::new(room_name))
            .subscribe(conn_id);
    }

    /// Unsubscribes a connection from a room.
    pub fn leave(&self, room_name: &str, conn_id: ConnectionId) {
        if let Some(mut room) = self.rooms.get_mut(room_name) {
            room.unsubscribe(conn_id);
            if room.is_empty() {
                drop(room);
                self.rooms.remove(room_name);
            }
        }
    }

    /// Unsubscribes a connection from the given rooms (disconnect path).
    pub fn leave_all(&self, rooms: &[String], conn_id: ConnectionId) {
        for room_name in rooms {
            self.leave(room_name, conn_id);
        }
    }

    /// Returns all subscriber connection IDs for a room.
    pub fn subscribers(&self, room_name: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room_name)
            .map(|r| r.get_subscribers())
            .unwrap_or_default()
    }

    /// Returns subscriber count for a room.
    pub fn subscriber_count(&self, room_name: &str) -> usize {
        self.rooms
            .get(room_name)
            .map(|r| r.subscriber_count())
            .unwrap_or(0)
    }

    /// Returns total number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
