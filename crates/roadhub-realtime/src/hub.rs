//! Central real-time hub that ties connections, rooms, and fan-out
//! together and implements the engine's [`RealtimeChannel`] seam.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use roadhub_core::config::realtime::RealtimeConfig;
use roadhub_core::result::AppResult;
use roadhub_entity::events::{JobEvent, RoomKey};
use roadhub_entity::traits::channel::RealtimeChannel;
use roadhub_entity::traits::store::{JobStore, QueueStore};

use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::pool::ConnectionPool;
use crate::message::types::{OutboundMessage, RoomSnapshot};
use crate::room::registry::RoomRegistry;

/// Real-time hub: connection pool + room registry + snapshot reads.
#[derive(Debug)]
pub struct RealtimeHub {
    pool: ConnectionPool,
    rooms: RoomRegistry,
    jobs: Arc<dyn JobStore>,
    queue: Arc<dyn QueueStore>,
    config: RealtimeConfig,
}

impl RealtimeHub {
    /// Creates a new hub over the given stores.
    pub fn new(
        config: RealtimeConfig,
        jobs: Arc<dyn JobStore>,
        queue: Arc<dyn QueueStore>,
    ) -> Self {
        info!("Real-time hub initialized");
        Self {
            pool: ConnectionPool::new(),
            rooms: RoomRegistry::new(),
            jobs,
            queue,
            config,
        }
    }

    /// Registers a new connection for a user.
    ///
    /// Returns the handle plus the receiver half the transport forwards to
    /// the socket. Exceeding the per-user connection limit evicts the
    /// oldest connection.
    pub fn register(
        &self,
        user_id: Uuid,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(user_id, tx));

        let existing = self.pool.get_user_connections(&user_id);
        if existing.len() >= self.config.max_connections_per_user {
            if let Some(oldest) = existing.first() {
                debug!(
                    user_id = %user_id,
                    conn_id = %oldest.id,
                    "User at max connections, evicting oldest"
                );
                oldest.mark_dead();
                self.pool.remove(&oldest.id);
            }
        }

        self.pool.add(handle.clone());
        info!(conn_id = %handle.id, user_id = %user_id, "Connection registered");
        (handle, rx)
    }

    /// Unregisters a connection and leaves all its rooms (explicit close
    /// or implied by disconnect).
    pub async fn unregister(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.mark_dead();
            let rooms = handle.joined_rooms().await;
            self.rooms.leave_all(&rooms, *conn_id);
            info!(conn_id = %conn_id, user_id = %handle.user_id, "Connection unregistered");
        }
    }

    /// Joins a connection to a room and returns the state snapshot, so a
    /// late subscriber is never missing context.
    pub async fn join_room(
        &self,
        conn_id: &ConnectionId,
        room: &RoomKey,
    ) -> AppResult<Option<RoomSnapshot>> {
        let Some(handle) = self.pool.get(conn_id) else {
            return Ok(None);
        };
        if handle.joined_rooms().await.len() >= self.config.max_rooms_per_connection {
            debug!(conn_id = %conn_id, "Room limit reached, join refused");
            return Ok(None);
        }

        let room_name = room.to_string();
        self.rooms.join(room_name.clone(), *conn_id);
        handle.track_room(&room_name).await;

        let snapshot = self.snapshot(room).await?;
        handle.send(OutboundMessage::RoomJoined {
            room: room_name,
            snapshot: snapshot.clone(),
        });
        Ok(Some(snapshot))
    }

    /// Leaves a room explicitly.
    pub async fn leave_room(&self, conn_id: &ConnectionId, room: &RoomKey) {
        let room_name = room.to_string();
        self.rooms.leave(&room_name, *conn_id);
        if let Some(handle) = self.pool.get(conn_id) {
            handle.untrack_room(&room_name).await;
            handle.send(OutboundMessage::RoomLeft { room: room_name });
        }
    }

    /// Whether a user currently has a live connection.
    pub fn is_online(&self, user_id: &Uuid) -> bool {
        self.pool.is_online(user_id)
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.pool.len()
    }

    /// Ping every connection (keepalive task).
    pub fn ping_all(&self, timestamp: i64) {
        for handle in self.pool.all() {
            handle.send(OutboundMessage::Ping { timestamp });
        }
    }

    /// Close every connection (graceful shutdown). The registry empties as
    /// a side effect and refills from joins after restart.
    pub async fn shutdown(&self) {
        let handles = self.pool.all();
        let count = handles.len();
        for handle in handles {
            handle.mark_dead();
            self.unregister(&handle.id).await;
        }
        info!(count, "All real-time connections closed");
    }

    /// Build the join snapshot for a room.
    async fn snapshot(&self, room: &RoomKey) -> AppResult<RoomSnapshot> {
        match room {
            RoomKey::Tracking(job_id) | RoomKey::Bidding(job_id) => {
                let Some(job) = self.jobs.get_job(*job_id).await? else {
                    return Ok(RoomSnapshot::empty());
                };
                let entry = self.queue.active_entry_for_job(*job_id).await?;
                Ok(RoomSnapshot {
                    job_id: Some(job.id),
                    status: Some(job.status),
                    contractor_id: job.contractor_id,
                    queue_position: entry.as_ref().map(|e| e.position),
                    estimated_start_at: entry.and_then(|e| e.estimated_start_at),
                    queue: None,
                })
            }
            RoomKey::Queue(contractor_id) => {
                let entries = self.queue.active_entries(*contractor_id).await?;
                Ok(RoomSnapshot {
                    job_id: None,
                    status: None,
                    contractor_id: Some(*contractor_id),
                    queue_position: None,
                    estimated_start_at: None,
                    queue: Some(entries.iter().map(|e| (e.job_id, e.position)).collect()),
                })
            }
            RoomKey::Route(_) => Ok(RoomSnapshot::empty()),
        }
    }
}

#[async_trait]
impl RealtimeChannel for RealtimeHub {
    /// Publish an event to every subscriber of a room. At-most-once: a
    /// room with no connected subscriber drops the event entirely.
    async fn broadcast_to_room(&self, room: &RoomKey, event: &JobEvent) {
        let room_name = room.to_string();
        let subscribers = self.rooms.subscribers(&room_name);
        if subscribers.is_empty() {
            return;
        }

        let mut delivered = 0;
        for conn_id in subscribers {
            if let Some(handle) = self.pool.get(&conn_id) {
                if handle.send(OutboundMessage::RoomEvent {
                    room: room_name.clone(),
                    event: event.clone(),
                }) {
                    delivered += 1;
                }
            }
        }
        debug!(room = %room_name, delivered, "Room event fanned out");
    }

    /// Push an event to every connection of a user. Offline users miss the
    /// event and recover state from the join snapshot on reconnect.
    async fn send_to_user(&self, user_id: Uuid, event: &JobEvent) {
        for handle in self.pool.get_user_connections(&user_id) {
            handle.send(OutboundMessage::UserEvent {
                event: event.clone(),
            });
        }
    }
}
