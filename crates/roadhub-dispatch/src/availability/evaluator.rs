//! Pure availability predicate.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::snapshot::AvailabilitySnapshot;

/// Why a contractor cannot take a job right now. Logged alongside every
/// rejection so dispatch decisions stay explainable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// The contractor's app session is not connected.
    Offline,
    /// The contractor toggled themselves closed for work.
    NotAvailable,
    /// The weekday is explicitly marked as a non-working day.
    DayDisabled,
    /// The current time falls outside the day's working-hours window.
    OutsideWorkingHours,
    /// An approved vacation interval covers the current time.
    OnVacation,
    /// The contractor already hit their daily job cap.
    DailyCapReached,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => write!(f, "offline"),
            Self::NotAvailable => write!(f, "not_available"),
            Self::DayDisabled => write!(f, "day_disabled"),
            Self::OutsideWorkingHours => write!(f, "outside_working_hours"),
            Self::OnVacation => write!(f, "on_vacation"),
            Self::DailyCapReached => write!(f, "daily_cap_reached"),
        }
    }
}

/// Decide whether the snapshotted contractor can take a job at `now`.
///
/// Pure and deterministic given its inputs. Checks short-circuit in a fixed
/// order, cheapest first — the flag checks cost nothing, while the vacation
/// and job-count inputs required store lookups to assemble:
/// online flag → availability flag → working-hours window → vacations →
/// daily job cap (missing cap means unlimited).
pub fn evaluate(
    snapshot: &AvailabilitySnapshot,
    now: DateTime<Utc>,
) -> Result<(), UnavailableReason> {
    let contractor = &snapshot.contractor;

    if !contractor.online {
        return Err(UnavailableReason::Offline);
    }
    if !contractor.available {
        return Err(UnavailableReason::NotAvailable);
    }

    if let Some(window) = contractor.schedule().window_for(now.weekday()) {
        if !window.enabled {
            return Err(UnavailableReason::DayDisabled);
        }
        let time = now.time().with_nanosecond(0).unwrap_or_else(|| now.time());
        if !window.contains(time) {
            return Err(UnavailableReason::OutsideWorkingHours);
        }
    }

    if snapshot.vacations.iter().any(|v| v.covers(now)) {
        return Err(UnavailableReason::OnVacation);
    }

    if let Some(max) = contractor.max_jobs_per_day {
        if snapshot.jobs_today >= i64::from(max) {
            return Err(UnavailableReason::DailyCapReached);
        }
    }

    Ok(())
}
