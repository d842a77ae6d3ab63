//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::message::types::OutboundMessage;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// A handle to a single WebSocket connection.
///
/// Holds the sender channel for pushing messages to the client, plus
/// metadata about the connected party.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// User (customer, contractor, or admin) who owns this connection
    pub user_id: Uuid,
    /// Sender for outbound messages
    pub sender: mpsc::Sender<OutboundMessage>,
    /// Rooms this connection has joined
    pub rooms: tokio::sync::RwLock<Vec<String>>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Whether the connection is still alive
    pub alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(user_id: Uuid, sender: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            sender,
            rooms: tokio::sync::RwLock::new(Vec::new()),
            connected_at: Utc::now(),
            alive: AtomicBool::new(true),
        }
    }

    /// Push an outbound message to this connection.
    ///
    /// Delivery is best-effort: a full buffer drops the message (the
    /// client re-syncs from the join snapshot on reconnect) and a closed
    /// channel marks the connection dead for cleanup.
    pub fn send(&self, msg: OutboundMessage) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(msg) {
            Ok(_) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Connection {} send buffer full, dropping message", self.id);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Record a joined room. Returns false if already joined.
    pub async fn track_room(&self, room: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        if rooms.iter().any(|r| r == room) {
            return false;
        }
        rooms.push(room.to_string());
        true
    }

    /// Forget a room. Returns whether it was tracked.
    pub async fn untrack_room(&self, room: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        let before = rooms.len();
        rooms.retain(|r| r != room);
        rooms.len() < before
    }

    /// Rooms currently joined.
    pub async fn joined_rooms(&self) -> Vec<String> {
        self.rooms.read().await.clone()
    }
}
