//! Real-time channel trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::events::{JobEvent, RoomKey};

/// Push delivery into the real-time layer.
///
/// Delivery is at-most-once and best-effort: events for rooms or users with
/// no connected subscriber are dropped, and subscribers recover state from
/// the join snapshot on reconnect.
#[async_trait]
pub trait RealtimeChannel: Send + Sync + std::fmt::Debug + 'static {
    /// Publish an event to every subscriber of a room.
    async fn broadcast_to_room(&self, room: &RoomKey, event: &JobEvent);

    /// Push an event to every connection of a specific user.
    async fn send_to_user(&self, user_id: Uuid, event: &JobEvent);
}
