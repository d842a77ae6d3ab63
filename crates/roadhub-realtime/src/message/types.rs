//! Inbound and outbound WebSocket message type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roadhub_core::types::id::{ContractorId, JobId};
use roadhub_entity::events::JobEvent;
use roadhub_entity::job::status::JobStatus;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Join a room (e.g., `"tracking:<job-id>"`).
    JoinRoom {
        /// Wire-level room name.
        room: String,
    },
    /// Leave a room.
    LeaveRoom {
        /// Wire-level room name.
        room: String,
    },
    /// Pong response to server ping.
    Pong {
        /// Echoed timestamp.
        timestamp: i64,
    },
}

/// State snapshot returned on room join, so a late subscriber is never
/// missing context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    /// The job the room tracks, when job-scoped.
    pub job_id: Option<JobId>,
    /// Current job status.
    pub status: Option<JobStatus>,
    /// Assigned contractor.
    pub contractor_id: Option<ContractorId>,
    /// Queue position (0 = current).
    pub queue_position: Option<i32>,
    /// Estimated start time for queued jobs.
    pub estimated_start_at: Option<DateTime<Utc>>,
    /// Active queue (job id, position) pairs, for queue-scoped rooms.
    pub queue: Option<Vec<(JobId, i32)>>,
}

impl RoomSnapshot {
    /// An empty snapshot (room exists, nothing known yet).
    pub fn empty() -> Self {
        Self {
            job_id: None,
            status: None,
            contractor_id: None,
            queue_position: None,
            estimated_start_at: None,
            queue: None,
        }
    }
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Room join confirmed, with the current state.
    RoomJoined {
        /// Wire-level room name.
        room: String,
        /// Current state snapshot.
        snapshot: RoomSnapshot,
    },
    /// Room left.
    RoomLeft {
        /// Wire-level room name.
        room: String,
    },
    /// A state-change event published into a room.
    RoomEvent {
        /// Wire-level room name.
        room: String,
        /// The event payload.
        event: JobEvent,
    },
    /// A state-change event addressed to this user directly.
    UserEvent {
        /// The event payload.
        event: JobEvent,
    },
    /// Ping (server keepalive).
    Ping {
        /// Server timestamp.
        timestamp: i64,
    },
    /// Error message.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}
