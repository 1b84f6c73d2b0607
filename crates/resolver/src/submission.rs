//! Submission state machine.
//!
//! ```text
//!   Idle ──submit──▶ Loading ──ack──────▶ Success ──▶ renders panel + close dialog
//!    ▲                  │
//!    │                  └────reject────▶ Error   (dialog stays open)
//!    │
//!   Success / Error ──submit──▶ Loading
//! ```
//!
//! The queue answers asynchronously. The task that waits for it shares one
//! atomic cell with the resolver holding both the state and a closed bit;
//! once the resolver is torn down a late answer is dropped without touching
//! the state or the dialog host. A task that goes away without an answer
//! leaves the state at `Error`, so the next submit is accepted.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use renderkit_common::error::{RenderkitError, RenderkitResult};
use renderkit_model::job::RenderJob;

use crate::queue::{JobReceipt, RenderJobQueue};

/// Progress of the latest submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// Waiting for the queue to answer.
    Loading,
    /// The queue accepted the job.
    Success,
    /// The queue rejected the job.
    Error,
}

impl SubmissionState {
    fn to_u8(self) -> u8 {
        match self {
            SubmissionState::Idle => 0,
            SubmissionState::Loading => 1,
            SubmissionState::Success => 2,
            SubmissionState::Error => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => SubmissionState::Loading,
            2 => SubmissionState::Success,
            3 => SubmissionState::Error,
            _ => SubmissionState::Idle,
        }
    }
}

/// UI surface the resolver reports back to after a successful submission.
///
/// Replaces reaching into global UI state (selected sidebar tab, open modal).
pub trait DialogHost: Send + Sync {
    /// Bring the list of renders into view.
    fn select_renders_panel(&self);

    /// Dismiss the render dialog.
    fn close_dialog(&self);
}

/// Set in the state cell once the dialog is torn down.
const CLOSED: u8 = 0x80;

/// Handle on the submission state shared with in-flight tasks.
///
/// The state and the liveness bit live in one atomic cell, so a transition
/// out of `Loading` and a teardown can never interleave.
#[derive(Debug, Clone)]
pub struct SubmissionTracker {
    cell: Arc<AtomicU8>,
}

impl Default for SubmissionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionTracker {
    pub fn new() -> Self {
        Self {
            cell: Arc::new(AtomicU8::new(SubmissionState::Idle.to_u8())),
        }
    }

    pub fn state(&self) -> SubmissionState {
        SubmissionState::from_u8(self.cell.load(Ordering::Acquire) & !CLOSED)
    }

    pub fn is_alive(&self) -> bool {
        self.cell.load(Ordering::Acquire) & CLOSED == 0
    }

    /// Move to `Loading`, refusing while a submission is already pending or
    /// after teardown.
    pub fn begin(&self) -> RenderkitResult<()> {
        let loading = SubmissionState::Loading.to_u8();
        let mut current = self.cell.load(Ordering::Acquire);
        loop {
            if current & CLOSED != 0 {
                return Err(RenderkitError::DialogClosed);
            }
            if current == loading {
                return Err(RenderkitError::SubmissionInFlight);
            }
            match self
                .cell
                .compare_exchange(current, loading, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    /// Apply the queue's answer. Returns false if the result was discarded.
    ///
    /// Fails once the dialog is closed: the closed bit makes the cell differ
    /// from a bare `Loading`.
    fn finish(&self, outcome: SubmissionState) -> bool {
        self.cell
            .compare_exchange(
                SubmissionState::Loading.to_u8(),
                outcome.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Mark the dialog closed. Only the first call has an effect.
    ///
    /// Returns true if this call performed the teardown.
    pub fn teardown(&self) -> bool {
        self.cell.fetch_or(CLOSED, Ordering::AcqRel) & CLOSED == 0
    }
}

/// Settles a submission as `Error` if its task goes away without an answer,
/// whether dropped unrun or cancelled while awaiting the queue.
#[derive(Debug)]
struct PendingSubmission {
    tracker: SubmissionTracker,
    settled: bool,
}

impl PendingSubmission {
    fn settle(&mut self, outcome: SubmissionState) -> bool {
        self.settled = true;
        self.tracker.finish(outcome)
    }
}

impl Drop for PendingSubmission {
    fn drop(&mut self) {
        if !self.settled && self.tracker.finish(SubmissionState::Error) {
            tracing::warn!("Render submission abandoned before the queue answered");
        }
    }
}

/// How a submission task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The queue accepted the job and the dialog was dismissed.
    Accepted(JobReceipt),
    /// The queue rejected the job; the dialog stays open.
    Rejected,
    /// The dialog was torn down before the queue answered.
    Discarded,
}

/// A submitted job waiting for the queue.
///
/// Await [`SubmissionTask::run`] or hand it to `tokio::spawn`.
#[must_use = "a submission does nothing until it is run"]
pub struct SubmissionTask {
    job: RenderJob,
    queue: Arc<dyn RenderJobQueue>,
    host: Arc<dyn DialogHost>,
    pending: PendingSubmission,
}

impl std::fmt::Debug for SubmissionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionTask")
            .field("job", &self.job)
            .field("tracker", &self.pending.tracker)
            .finish_non_exhaustive()
    }
}

impl SubmissionTask {
    pub(crate) fn new(
        job: RenderJob,
        queue: Arc<dyn RenderJobQueue>,
        host: Arc<dyn DialogHost>,
        tracker: SubmissionTracker,
    ) -> Self {
        Self {
            job,
            queue,
            host,
            pending: PendingSubmission {
                tracker,
                settled: false,
            },
        }
    }

    /// The descriptor being submitted.
    pub fn job(&self) -> &RenderJob {
        &self.job
    }

    /// Send the job to the queue and apply the answer.
    pub async fn run(self) -> SubmissionOutcome {
        let SubmissionTask {
            job,
            queue,
            host,
            mut pending,
        } = self;
        let composition = job.composition_id().to_string();
        let result = queue.enqueue(job).await;

        let outcome = if result.is_ok() {
            SubmissionState::Success
        } else {
            SubmissionState::Error
        };
        if !pending.settle(outcome) {
            tracing::debug!(composition = %composition, "Dialog closed; discarding submission result");
            return SubmissionOutcome::Discarded;
        }

        match result {
            Ok(receipt) => {
                tracing::info!(
                    composition = %composition,
                    job_id = %receipt.job_id,
                    "Render job accepted"
                );
                // The host may tear the dialog down from inside a callback.
                if pending.tracker.is_alive() {
                    host.select_renders_panel();
                }
                if pending.tracker.is_alive() {
                    host.close_dialog();
                }
                SubmissionOutcome::Accepted(receipt)
            }
            Err(e) => {
                tracing::warn!(composition = %composition, error = %e, "Render job rejected");
                SubmissionOutcome::Rejected
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_rejects_overlap() {
        let tracker = SubmissionTracker::new();
        assert_eq!(tracker.state(), SubmissionState::Idle);
        tracker.begin().unwrap();
        assert_eq!(tracker.state(), SubmissionState::Loading);
        assert!(matches!(
            tracker.begin(),
            Err(RenderkitError::SubmissionInFlight)
        ));
    }

    #[test]
    fn test_terminal_states_allow_resubmit() {
        let tracker = SubmissionTracker::new();
        tracker.begin().unwrap();
        assert!(tracker.finish(SubmissionState::Error));
        assert_eq!(tracker.state(), SubmissionState::Error);
        tracker.begin().unwrap();
        assert!(tracker.finish(SubmissionState::Success));
        tracker.begin().unwrap();
        assert_eq!(tracker.state(), SubmissionState::Loading);
    }

    #[test]
    fn test_finish_after_teardown_is_ignored() {
        let tracker = SubmissionTracker::new();
        tracker.begin().unwrap();
        assert!(tracker.teardown());
        assert!(!tracker.teardown());
        assert!(!tracker.finish(SubmissionState::Success));
        assert_eq!(tracker.state(), SubmissionState::Loading);
        assert!(matches!(tracker.begin(), Err(RenderkitError::DialogClosed)));
    }

    #[test]
    fn test_teardown_and_finish_never_interleave() {
        for _ in 0..500 {
            let tracker = SubmissionTracker::new();
            tracker.begin().unwrap();
            let barrier = Arc::new(std::sync::Barrier::new(2));

            let finisher = {
                let tracker = tracker.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    tracker.finish(SubmissionState::Success)
                })
            };
            barrier.wait();
            tracker.teardown();
            let after_teardown = tracker.state();
            let finished = finisher.join().unwrap();

            assert_eq!(tracker.state(), after_teardown);
            assert_eq!(finished, after_teardown == SubmissionState::Success);
        }
    }

    struct AcceptingQueue;

    #[async_trait::async_trait]
    impl RenderJobQueue for AcceptingQueue {
        async fn enqueue_still(
            &self,
            _job: renderkit_model::job::StillJob,
        ) -> RenderkitResult<JobReceipt> {
            Ok(JobReceipt {
                job_id: "still-1".to_string(),
            })
        }

        async fn enqueue_video(
            &self,
            _job: renderkit_model::job::VideoJob,
        ) -> RenderkitResult<JobReceipt> {
            Ok(JobReceipt {
                job_id: "video-1".to_string(),
            })
        }
    }

    /// Host that closes the session as soon as the renders panel is shown.
    struct ClosingHost {
        tracker: SubmissionTracker,
        closed: std::sync::atomic::AtomicUsize,
    }

    impl DialogHost for ClosingHost {
        fn select_renders_panel(&self) {
            self.tracker.teardown();
        }

        fn close_dialog(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn still_job() -> RenderJob {
        RenderJob::Still(renderkit_model::job::StillJob {
            composition_id: "thumb".to_string(),
            out_name: "thumb.png".to_string(),
            image_format: renderkit_model::format::ImageFormat::Png,
            quality: None,
            frame: 0,
            scale: 1.0,
            verbose: false,
        })
    }

    #[test]
    fn test_dropped_task_settles_as_error() {
        let tracker = SubmissionTracker::new();
        tracker.begin().unwrap();
        let task = SubmissionTask::new(
            still_job(),
            Arc::new(AcceptingQueue),
            Arc::new(ClosingHost {
                tracker: tracker.clone(),
                closed: Default::default(),
            }),
            tracker.clone(),
        );
        drop(task);

        assert_eq!(tracker.state(), SubmissionState::Error);
        assert!(tracker.begin().is_ok());
    }

    #[test]
    fn test_dropped_task_after_teardown_changes_nothing() {
        let tracker = SubmissionTracker::new();
        tracker.begin().unwrap();
        let task = SubmissionTask::new(
            still_job(),
            Arc::new(AcceptingQueue),
            Arc::new(ClosingHost {
                tracker: tracker.clone(),
                closed: Default::default(),
            }),
            tracker.clone(),
        );
        tracker.teardown();
        drop(task);

        assert_eq!(tracker.state(), SubmissionState::Loading);
    }

    #[tokio::test]
    async fn test_no_host_call_after_teardown_inside_callback() {
        let tracker = SubmissionTracker::new();
        tracker.begin().unwrap();
        let host = Arc::new(ClosingHost {
            tracker: tracker.clone(),
            closed: Default::default(),
        });
        let task = SubmissionTask::new(
            still_job(),
            Arc::new(AcceptingQueue),
            host.clone(),
            tracker.clone(),
        );

        let outcome = task.run().await;
        assert!(matches!(outcome, SubmissionOutcome::Accepted(_)));
        assert_eq!(tracker.state(), SubmissionState::Success);
        assert!(!tracker.is_alive());
        assert_eq!(host.closed.load(Ordering::SeqCst), 0);
    }
}
