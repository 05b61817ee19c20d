//! Drives one report job from submission to completion or failure.
//!
//! # Architecture
//!
//! ```text
//! submit()
//!     │
//!     ├─► validate locally (no IO on failure)
//!     ├─► claim state (cancels the previous job token)
//!     ├─► BaseReportService::create_report_job
//!     └─► spawn poll loop ──► tick (immediately, then every interval)
//!                               ├─► fetch_report_job
//!                               └─► JobSnapshot::apply_status ──► watch channel
//! ```
//!
//! The snapshot lives in a `watch` channel. The active submit or poll is the
//! only writer; callers read it with [`ReportJobController::snapshot`] or
//! wait for changes on [`ReportJobController::subscribe`].

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use audit_api_client::{ReportJob, Result as ApiResult};
use tokio::sync::{oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ReportJobError, Result};
use crate::filename::DownloadedArtifact;
use crate::poller::PollHandle;
use crate::request::ReportRequest;
use crate::service::BaseReportService;
use crate::state::{JobPhase, JobSnapshot, PollOutcome};

/// Default time between status requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Polling policy for a controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Time between status requests.
    pub poll_interval: Duration,
    /// Give up on a job still queued or processing after this long.
    /// `None` polls until the server reports a terminal status.
    pub poll_timeout: Option<Duration>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: None,
        }
    }
}

/// Owns the state of one report workflow and at most one poll task.
pub struct ReportJobController {
    service: Arc<dyn BaseReportService>,
    config: ControllerConfig,
    state: Arc<watch::Sender<JobSnapshot>>,
    active: Mutex<Option<ActiveJob>>,
}

/// The submission currently allowed to write state, and its poll task once
/// the job exists. Both share one token.
struct ActiveJob {
    token: CancellationToken,
    poller: Option<PollHandle>,
}

impl Drop for ActiveJob {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl ReportJobController {
    pub fn new(service: Arc<dyn BaseReportService>) -> Self {
        Self::with_config(service, ControllerConfig::default())
    }

    pub fn with_config(service: Arc<dyn BaseReportService>, config: ControllerConfig) -> Self {
        let (state, _) = watch::channel(JobSnapshot::default());
        Self {
            service,
            config,
            state: Arc::new(state),
            active: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Current state.
    pub fn snapshot(&self) -> JobSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.state.subscribe()
    }

    /// A poll task is running.
    pub fn is_polling(&self) -> bool {
        self.active_slot()
            .as_ref()
            .and_then(|active| active.poller.as_ref())
            .is_some_and(PollHandle::is_active)
    }

    /// Validate and queue a report, then start polling its status.
    ///
    /// The first status request is made before this returns. A validation
    /// failure leaves the current state, including any running poll,
    /// untouched. If the submission is abandoned before the job is created
    /// (by `reset`, `cancel_polling`, or dropping this future) the created
    /// job is never tracked and the controller is left idle.
    pub async fn submit(&self, request: &ReportRequest) -> Result<String> {
        let payload = request.validate().inspect_err(|e| {
            debug!(error = %e, "Report request rejected");
        })?;

        let token = CancellationToken::new();
        let mut claimed = false;
        self.state.send_if_modified(|snapshot| {
            if snapshot.phase == JobPhase::Submitting {
                return false;
            }
            // Replacing the active job cancels its token, so a poll result
            // still in flight for it is discarded.
            *self.active_slot() = Some(ActiveJob {
                token: token.clone(),
                poller: None,
            });
            snapshot.begin_submission(&payload.address);
            claimed = true;
            true
        });
        if !claimed {
            return Err(ReportJobError::SubmissionInFlight);
        }
        let pending = PendingSubmission::new(&self.state, token.clone());

        info!(
            address = %payload.address,
            deficiency_only = payload.deficiency_only.unwrap_or(false),
            visits = payload.visit_ids.as_ref().map_or(0, Vec::len),
            "Submitting report job"
        );

        let created = match self.service.create_report_job(&payload).await {
            Ok(created) => created,
            Err(e) => {
                pending.disarm();
                warn!(error = %e, "Report job submission failed");
                let message = e.to_string();
                self.state.send_if_modified(|snapshot| {
                    if token.is_cancelled() {
                        return false;
                    }
                    snapshot.submission_failed(message);
                    true
                });
                return Err(ReportJobError::Submission(e));
            }
        };
        pending.disarm();

        let job_id = created.job_id;
        let accepted = self.state.send_if_modified(|snapshot| {
            if token.is_cancelled() {
                return false;
            }
            snapshot.job_created(&job_id);
            true
        });
        if !accepted {
            info!(job_id = %job_id, "Report submission was cancelled, not tracking job");
            return Err(ReportJobError::Cancelled);
        }

        info!(job_id = %job_id, "Report job queued, polling for completion");
        if let Some(first_poll) = self.start_polling(job_id.clone(), token) {
            // Resolves once the immediate poll has been applied, or the loop
            // was cancelled before that.
            let _ = first_poll.await;
        }

        Ok(job_id)
    }

    /// Stop the poll timer without touching the phase. Idempotent.
    ///
    /// A submission still waiting on the server is abandoned instead, and
    /// the controller returns to idle.
    pub fn cancel_polling(&self) {
        self.state.send_if_modified(|snapshot| {
            if self.active_slot().take().is_some() {
                debug!("Report polling cancelled");
            }
            if snapshot.phase == JobPhase::Submitting {
                *snapshot = JobSnapshot::default();
                return true;
            }
            false
        });
    }

    /// Drop the current job entirely and return to idle.
    pub fn reset(&self) {
        self.state.send_modify(|snapshot| {
            self.active_slot().take();
            *snapshot = JobSnapshot::default();
        });
    }

    /// Download a job's artifact. Never changes the phase; each call is a
    /// separate request.
    pub async fn download(&self, job_id: &str) -> Result<DownloadedArtifact> {
        match self.service.download_report(job_id).await {
            Ok(report) => {
                let address = self.state.borrow().address.clone().unwrap_or_default();
                let artifact = DownloadedArtifact::from_report(job_id, report, &address);
                info!(job_id, filename = %artifact.filename, bytes = artifact.bytes.len(), "Report downloaded");
                self.state
                    .send_modify(|snapshot| snapshot.download_succeeded(job_id, &artifact.filename));
                Ok(artifact)
            }
            Err(e) => {
                warn!(job_id, error = %e, "Report download failed");
                let message = e.to_string();
                self.state
                    .send_modify(|snapshot| snapshot.download_failed(message));
                Err(ReportJobError::Download(e))
            }
        }
    }

    /// Spawn the poll loop for a created job, unless its submission has
    /// been superseded or cancelled in the meantime.
    fn start_polling(
        &self,
        job_id: String,
        token: CancellationToken,
    ) -> Option<oneshot::Receiver<()>> {
        let mut slot = self.active_slot();
        // Every replacement of the slot cancels the previous token under
        // this lock, so an uncancelled token still owns the slot.
        let active = slot.as_mut().filter(|_| !token.is_cancelled())?;

        let (first_poll_tx, first_poll_rx) = oneshot::channel();
        let poll_loop = run_poll_loop(
            self.service.clone(),
            self.state.clone(),
            token.clone(),
            job_id,
            self.config.clone(),
            first_poll_tx,
        );
        active.poller = Some(PollHandle::spawn(token, poll_loop));
        Some(first_poll_rx)
    }

    // Lock order: the watch channel first, then this slot. Never the reverse.
    fn active_slot(&self) -> MutexGuard<'_, Option<ActiveJob>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Held while the create request is in flight. If the submitting future is
/// dropped before the server answers, the controller goes back to idle,
/// provided nothing else has taken over the state since.
struct PendingSubmission<'a> {
    state: &'a watch::Sender<JobSnapshot>,
    token: CancellationToken,
    armed: bool,
}

impl<'a> PendingSubmission<'a> {
    fn new(state: &'a watch::Sender<JobSnapshot>, token: CancellationToken) -> Self {
        Self {
            state,
            token,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let token = &self.token;
        self.state.send_if_modified(|snapshot| {
            if token.is_cancelled() || snapshot.phase != JobPhase::Submitting {
                return false;
            }
            token.cancel();
            *snapshot = JobSnapshot::default();
            true
        });
        debug!("Report submission abandoned");
    }
}

async fn run_poll_loop(
    service: Arc<dyn BaseReportService>,
    state: Arc<watch::Sender<JobSnapshot>>,
    token: CancellationToken,
    job_id: String,
    config: ControllerConfig,
    first_poll: oneshot::Sender<()>,
) {
    let deadline = config
        .poll_timeout
        .map(|limit| (Instant::now() + limit, limit));
    let mut first_poll = Some(first_poll);

    // The first tick completes immediately, so the first poll does not wait
    // for a full interval.
    let mut interval = tokio::time::interval(config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }

        let result = tokio::select! {
            _ = token.cancelled() => break,
            result = service.fetch_report_job(&job_id) => result,
        };

        let outcome = apply_poll(&state, &token, &job_id, result, deadline);
        if let Some(tx) = first_poll.take() {
            let _ = tx.send(());
        }
        if outcome == PollOutcome::Stop {
            break;
        }
    }

    debug!(job_id = %job_id, "Report poll loop finished");
}

/// Apply one poll result unless the loop has been cancelled.
///
/// The cancellation check runs under the channel's write lock, so a loop
/// cancelled by a newer submission can never overwrite that submission's
/// state.
fn apply_poll(
    state: &watch::Sender<JobSnapshot>,
    token: &CancellationToken,
    job_id: &str,
    result: ApiResult<ReportJob>,
    deadline: Option<(Instant, Duration)>,
) -> PollOutcome {
    let mut outcome = PollOutcome::Stop;

    state.send_if_modified(|snapshot| {
        if token.is_cancelled() {
            return false;
        }

        outcome = match result {
            Ok(job) => {
                debug!(job_id, status = %job.status, download_ready = job.download_ready, "Polled report job");
                match snapshot.apply_status(job) {
                    PollOutcome::Continue => match deadline {
                        Some((at, limit)) if Instant::now() >= at => {
                            warn!(job_id, limit_secs = limit.as_secs(), "Report job timed out");
                            snapshot.timed_out(limit)
                        }
                        _ => PollOutcome::Continue,
                    },
                    PollOutcome::Stop => {
                        match snapshot.phase {
                            JobPhase::Completed => info!(job_id, "Report job completed"),
                            _ => warn!(job_id, error = ?snapshot.error, "Report job failed"),
                        }
                        PollOutcome::Stop
                    }
                }
            }
            Err(e) => {
                warn!(job_id, error = %e, "Report status request failed");
                snapshot.poll_failed(e.to_string())
            }
        };
        true
    });

    outcome
}
