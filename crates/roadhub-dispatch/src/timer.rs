//! Per-job acceptance timer registry.
//!
//! One outstanding timer per job awaiting acceptance. The timer is a
//! fast-path optimization only: it does not survive a restart, and the
//! reminder sweep re-derives the same escalation from the persisted
//! `assigned_at` timestamp, so losing timers costs latency, never
//! correctness.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use roadhub_core::types::id::{ContractorId, JobId};

use crate::assignment::AssignmentService;

/// A registered timer. The sequence number lets a finished task remove its
/// own slot without clobbering a newer timer for the same job.
#[derive(Debug)]
struct TimerSlot {
    seq: u64,
    token: CancellationToken,
}

/// Registry of in-flight acceptance timers, keyed by job id.
#[derive(Debug, Clone)]
pub struct AcceptanceTimerRegistry {
    timers: Arc<DashMap<JobId, TimerSlot>>,
    seq: Arc<AtomicU64>,
    window: Duration,
}

impl AcceptanceTimerRegistry {
    /// Create a registry with the given acceptance window.
    pub fn new(window: Duration) -> Self {
        Self {
            timers: Arc::new(DashMap::new()),
            seq: Arc::new(AtomicU64::new(0)),
            window,
        }
    }

    /// Arm the acceptance timer for a job/contractor pair.
    ///
    /// Replaces (and cancels) any previous timer for the job, keeping the
    /// one-outstanding-timer-per-job invariant. If the timer fires and the
    /// escalation reassigns the job, a fresh timer is armed for the
    /// replacement contractor automatically.
    pub fn start(
        &self,
        job_id: JobId,
        contractor_id: ContractorId,
        service: Arc<AssignmentService>,
    ) {
        let token = CancellationToken::new();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let slot = TimerSlot {
            seq,
            token: token.clone(),
        };
        if let Some(previous) = self.timers.insert(job_id, slot) {
            previous.token.cancel();
        }

        let registry = self.clone();
        let window = self.window;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(job_id = %job_id, "Acceptance timer cancelled");
                }
                _ = tokio::time::sleep(window) => {
                    match service
                        .handle_acceptance_timeout(job_id, contractor_id)
                        .await
                    {
                        Ok(Some(next_contractor)) => {
                            // Reassigned: the new assignment gets its own
                            // acceptance window.
                            registry.start(job_id, next_contractor, Arc::clone(&service));
                            return;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            error!(
                                job_id = %job_id,
                                error = %e,
                                "Acceptance timeout handling failed"
                            );
                        }
                    }
                }
            }
            registry.remove_slot(job_id, seq);
        });
    }

    /// Cancel a job's timer. Idempotent: returns `true` only for the call
    /// that actually cancelled a live timer.
    pub fn cancel(&self, job_id: JobId) -> bool {
        match self.timers.remove(&job_id) {
            Some((_, slot)) => {
                slot.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Number of armed timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Cancel every armed timer (graceful shutdown).
    pub fn shutdown(&self) {
        let jobs: Vec<JobId> = self.timers.iter().map(|e| *e.key()).collect();
        for job_id in jobs {
            self.cancel(job_id);
        }
    }

    /// Drop the slot a finished task owned, leaving newer slots intact.
    fn remove_slot(&self, job_id: JobId, seq: u64) {
        self.timers.remove_if(&job_id, |_, slot| slot.seq == seq);
    }
}
