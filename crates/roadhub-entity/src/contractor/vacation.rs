//! Contractor vacation request entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use roadhub_core::types::id::{ContractorId, VacationId};

/// Approval status of a vacation request. Only approved requests block
/// availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vacation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VacationStatus {
    /// Awaiting admin review.
    Pending,
    /// Approved; the interval blocks assignment.
    Approved,
    /// Rejected.
    Rejected,
}

impl fmt::Display for VacationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A contractor's vacation interval.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VacationRequest {
    /// Unique request identifier.
    pub id: VacationId,
    /// The requesting contractor.
    pub contractor_id: ContractorId,
    /// Interval start (inclusive).
    pub starts_at: DateTime<Utc>,
    /// Interval end (inclusive).
    pub ends_at: DateTime<Utc>,
    /// Approval status.
    pub status: VacationStatus,
    /// When the request was filed.
    pub created_at: DateTime<Utc>,
}

impl VacationRequest {
    /// Check whether a point in time falls inside the interval (inclusive
    /// on both ends).
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        at >= self.starts_at && at <= self.ends_at
    }
}
