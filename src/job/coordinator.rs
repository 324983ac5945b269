//! Polling state machine for bulk price-search jobs
//!
//! Lifecycle: submit → INITIALIZING → PROCESSING → COMPLETED | ERROR.
//! Progress fields from each poll are surfaced to the caller but never drive
//! control flow beyond terminal-stage detection. A failed poll does not
//! abandon a job that may still be running server-side; only a terminal
//! stage, the poll budget, or an explicit cancel ends the loop.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{RepricerError, RepricerResult};
use crate::job::client::PriceSearchApi;
use crate::tracker::{MergeReport, ProductTracker};
use crate::types::{JobStage, JobStatus};

/// Poll timing and budget.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Fixed delay between status polls.
    pub interval: Duration,
    /// Maximum polls before the job is declared lost.
    pub max_polls: u32,
    /// Delay after a terminal stage before the slot is released, so callers
    /// can show the terminal state before the coordinator goes inactive.
    pub grace: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_polls: 300,
            grace: Duration::from_secs(2),
        }
    }
}

#[derive(Debug)]
struct ActiveJob {
    job_id: Option<String>,
    submitted_at: DateTime<Utc>,
    cancel_requested: bool,
}

/// Session-scoped single-active-job lock.
///
/// An explicit value object rather than a module singleton: each session owns
/// its own slot, so concurrent sessions and tests never share job state.
#[derive(Clone, Default)]
pub struct JobSlot {
    inner: Arc<Mutex<Option<ActiveJob>>>,
}

impl JobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ActiveJob>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    pub fn active_job_id(&self) -> Option<String> {
        self.lock().as_ref().and_then(|job| job.job_id.clone())
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.lock().as_ref().map(|job| job.submitted_at)
    }

    /// Ask the active job to stop. Returns false when no job is active.
    pub fn request_cancel(&self) -> bool {
        match self.lock().as_mut() {
            Some(job) => {
                job.cancel_requested = true;
                true
            }
            None => false,
        }
    }

    /// Claim the slot for a new submission; rejected while a job is active.
    fn try_begin(&self) -> RepricerResult<()> {
        let mut guard = self.lock();
        if guard.is_some() {
            return Err(RepricerError::JobActive);
        }
        *guard = Some(ActiveJob {
            job_id: None,
            submitted_at: Utc::now(),
            cancel_requested: false,
        });
        Ok(())
    }

    fn set_job_id(&self, job_id: &str) {
        if let Some(job) = self.lock().as_mut() {
            job.job_id = Some(job_id.to_string());
        }
    }

    fn cancel_requested(&self) -> bool {
        self.lock()
            .as_ref()
            .map(|job| job.cancel_requested)
            .unwrap_or(false)
    }

    fn release(&self) {
        *self.lock() = None;
    }
}

/// Drives one bulk price-search job from submission to merged results.
pub struct PriceSearchCoordinator<A: PriceSearchApi> {
    api: A,
    slot: JobSlot,
    poll: PollConfig,
}

impl<A: PriceSearchApi> PriceSearchCoordinator<A> {
    pub fn new(api: A, slot: JobSlot) -> Self {
        Self {
            api,
            slot,
            poll: PollConfig::default(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn slot(&self) -> &JobSlot {
        &self.slot
    }

    /// Run the asynchronous job to completion, merging its results into
    /// `tracker` as one atomic batch. `on_progress` receives every status
    /// snapshot for display.
    ///
    /// Transport failures while polling are logged and tolerated. Manual
    /// edits made while the job is in flight win over bulk results and are
    /// reported as conflicts in the returned [`MergeReport`].
    pub async fn run<F>(
        &self,
        tracker: &mut ProductTracker,
        mut on_progress: F,
    ) -> RepricerResult<MergeReport>
    where
        F: FnMut(&JobStatus),
    {
        let items = tracker.search_items();
        if items.is_empty() {
            return Err(RepricerError::JobSubmit(
                "no products to search".to_string(),
            ));
        }

        self.slot.try_begin()?;
        let snapshot = tracker.revision_snapshot();

        let job_id = match self.api.start_job(&items).await {
            Ok(id) => id,
            Err(e) => {
                // Transport failure: surface immediately, no job state kept
                self.slot.release();
                return Err(e);
            }
        };
        self.slot.set_job_id(&job_id);
        info!(job_id = %job_id, items = items.len(), "bulk price search submitted");

        let mut polls = 0u32;
        loop {
            if self.slot.cancel_requested() {
                if let Err(e) = self.api.stop_job(&job_id).await {
                    warn!(job_id = %job_id, error = %e, "job-stop request failed");
                }
                self.slot.release();
                return Err(RepricerError::JobCancelled);
            }

            if polls >= self.poll.max_polls {
                warn!(job_id = %job_id, polls, "poll budget exhausted");
                self.slot.release();
                return Err(RepricerError::JobTimeout);
            }
            tokio::time::sleep(self.poll.interval).await;
            polls += 1;

            let status = match self.api.job_status(&job_id).await {
                Ok(status) => status,
                Err(e) => {
                    // A single failed poll must not abandon a job that may
                    // still be running server-side
                    warn!(job_id = %job_id, error = %e, "status poll failed, continuing");
                    continue;
                }
            };
            on_progress(&status);

            match status.stage {
                JobStage::Initializing | JobStage::Processing => {}
                JobStage::Completed => {
                    let results = status.results.unwrap_or_default();
                    let report = tracker.merge_bulk_results(&results, &snapshot);
                    info!(
                        job_id = %job_id,
                        updated = report.updated_count(),
                        noops = report.noops,
                        conflicts = report.conflicts.len(),
                        unmatched = report.unmatched.len(),
                        "bulk price search completed"
                    );
                    tokio::time::sleep(self.poll.grace).await;
                    self.slot.release();
                    return Ok(report);
                }
                JobStage::Error => {
                    let message = status
                        .error
                        .unwrap_or_else(|| "price search job failed".to_string());
                    warn!(job_id = %job_id, error = %message, "bulk price search failed");
                    tokio::time::sleep(self.poll.grace).await;
                    self.slot.release();
                    return Err(RepricerError::JobTerminal(message));
                }
            }
        }
    }

    /// Degraded synchronous variant: one request, one response, hard timeout
    /// enforced by the client. Shares the single-active-job slot and the
    /// merge path with the asynchronous job.
    pub async fn run_once(&self, tracker: &mut ProductTracker) -> RepricerResult<MergeReport> {
        let items = tracker.search_items();
        if items.is_empty() {
            return Err(RepricerError::JobSubmit(
                "no products to search".to_string(),
            ));
        }

        self.slot.try_begin()?;
        let snapshot = tracker.revision_snapshot();

        let results = match self.api.search_prices(&items).await {
            Ok(results) => results,
            Err(e) => {
                self.slot.release();
                return Err(e);
            }
        };

        let report = tracker.merge_bulk_results(&results, &snapshot);
        info!(
            updated = report.updated_count(),
            noops = report.noops,
            "one-shot price search merged"
        );
        self.slot.release();
        Ok(report)
    }

    /// Request cancellation of the active job, if any. The polling loop
    /// forwards the stop to the server and releases the slot.
    pub fn cancel(&self) -> bool {
        self.slot.request_cancel()
    }
}
