//! Observable job state and its transitions.
//!
//! The transitions here are pure: no IO, no timers, no async. The controller
//! feeds them service responses and publishes the resulting snapshot.
//!
//! ```text
//! Idle ──submit──► Submitting ──created──► Polling ──┬─► Completed
//!  ▲                   │                      │      └─► Failed
//!  └──── rejected ─────┘                      └─ queued/processing (stay)
//! ```

use std::fmt;
use std::time::Duration;

use audit_api_client::{JobStatus, ReportJob};

/// Shown when the server reports a failure without saying why.
pub const JOB_FAILED_FALLBACK: &str = "Report generation failed";

/// Shown once the artifact is ready.
pub const READY_NOTICE: &str = "Report ready for download.";

/// Where the controller is in a job's lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Completed | JobPhase::Failed)
    }

    /// A job is being created or generated.
    pub fn is_busy(self) -> bool {
        matches!(self, JobPhase::Submitting | JobPhase::Polling)
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobPhase::Idle => "idle",
            JobPhase::Submitting => "submitting",
            JobPhase::Polling => "polling",
            JobPhase::Completed => "completed",
            JobPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Whether polling should go on after a status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Continue,
    Stop,
}

/// Most recent successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastDownload {
    pub job_id: String,
    pub filename: String,
}

/// Everything a UI needs to render the report workflow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSnapshot {
    pub phase: JobPhase,
    pub job_id: Option<String>,
    pub address: Option<String>,
    /// Latest status reported by the server.
    pub job: Option<ReportJob>,
    /// Progress line while the job is queued or generating.
    pub progress: Option<String>,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub last_download: Option<LastDownload>,
}

impl JobSnapshot {
    pub fn download_ready(&self) -> bool {
        self.job.as_ref().is_some_and(|job| job.download_ready)
    }

    pub(crate) fn begin_submission(&mut self, address: &str) {
        *self = JobSnapshot {
            phase: JobPhase::Submitting,
            address: Some(address.to_string()),
            progress: Some("Report queued for generation…".to_string()),
            ..JobSnapshot::default()
        };
    }

    pub(crate) fn submission_failed(&mut self, message: String) {
        self.phase = JobPhase::Idle;
        self.job_id = None;
        self.job = None;
        self.progress = None;
        self.error = Some(message);
    }

    pub(crate) fn job_created(&mut self, job_id: &str) {
        self.phase = JobPhase::Polling;
        self.job_id = Some(job_id.to_string());
    }

    /// Fold one status response into the snapshot.
    pub(crate) fn apply_status(&mut self, job: ReportJob) -> PollOutcome {
        let outcome = match job.status {
            JobStatus::Failed => {
                let message = job
                    .error
                    .as_deref()
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .unwrap_or(JOB_FAILED_FALLBACK)
                    .to_string();
                self.phase = JobPhase::Failed;
                self.progress = None;
                self.error = Some(message);
                PollOutcome::Stop
            }
            JobStatus::Completed if job.download_ready => {
                self.phase = JobPhase::Completed;
                self.progress = None;
                self.notice = Some(READY_NOTICE.to_string());
                self.last_download = None;
                PollOutcome::Stop
            }
            _ => {
                self.notice = None;
                self.progress = Some(progress_message(&job));
                PollOutcome::Continue
            }
        };
        self.job = Some(job);
        outcome
    }

    /// The status request itself failed; polling ends.
    pub(crate) fn poll_failed(&mut self, message: String) -> PollOutcome {
        self.phase = JobPhase::Failed;
        self.progress = None;
        self.error = Some(message);
        PollOutcome::Stop
    }

    pub(crate) fn timed_out(&mut self, limit: Duration) -> PollOutcome {
        self.poll_failed(format!(
            "Report generation timed out after {} seconds",
            limit.as_secs()
        ))
    }

    pub(crate) fn download_succeeded(&mut self, job_id: &str, filename: &str) {
        self.error = None;
        self.last_download = Some(LastDownload {
            job_id: job_id.to_string(),
            filename: filename.to_string(),
        });
    }

    pub(crate) fn download_failed(&mut self, message: String) {
        self.error = Some(message);
    }
}

/// Progress line for a job that is still running, naming what it covers.
pub fn progress_message(job: &ReportJob) -> String {
    let kind = if job.deficiency_only {
        "Deficiency list"
    } else {
        "Report"
    };
    let scope = scope_label(job);

    match &job.status {
        JobStatus::Queued => format!("{kind} queued for generation ({scope})…"),
        JobStatus::Processing => format!("{kind} generation in progress ({scope})…"),
        other => format!("Status: {other} ({scope})"),
    }
}

/// What a job covers: its entire history or a count of selected audits.
pub fn scope_label(job: &ReportJob) -> String {
    if job.include_all {
        return "entire history".to_string();
    }
    match job.selected_audit_count {
        Some(1) => "1 audit".to_string(),
        Some(count) => format!("{count} audits"),
        None => "selected audits".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polling() -> JobSnapshot {
        let mut snapshot = JobSnapshot::default();
        snapshot.begin_submission("123 Main St");
        snapshot.job_created("abc");
        snapshot
    }

    #[test]
    fn queued_job_keeps_polling_with_scope() {
        let mut snapshot = polling();
        let mut job = ReportJob::new("abc", JobStatus::Queued);
        job.include_all = true;

        assert_eq!(snapshot.apply_status(job), PollOutcome::Continue);
        assert_eq!(snapshot.phase, JobPhase::Polling);
        assert_eq!(
            snapshot.progress.as_deref(),
            Some("Report queued for generation (entire history)…")
        );
    }

    #[test]
    fn processing_deficiency_list_names_selected_count() {
        let mut job = ReportJob::new("abc", JobStatus::Processing);
        job.deficiency_only = true;
        job.selected_audit_count = Some(3);

        assert_eq!(
            progress_message(&job),
            "Deficiency list generation in progress (3 audits)…"
        );
    }

    #[test]
    fn completed_without_artifact_is_not_terminal() {
        let mut snapshot = polling();
        let job = ReportJob::new("abc", JobStatus::Completed);

        assert_eq!(snapshot.apply_status(job), PollOutcome::Continue);
        assert_eq!(snapshot.phase, JobPhase::Polling);
        assert!(!snapshot.download_ready());
    }

    #[test]
    fn completed_and_ready_stops() {
        let mut snapshot = polling();
        let mut job = ReportJob::new("abc", JobStatus::Completed);
        job.download_ready = true;

        assert_eq!(snapshot.apply_status(job), PollOutcome::Stop);
        assert_eq!(snapshot.phase, JobPhase::Completed);
        assert_eq!(snapshot.progress, None);
        assert_eq!(snapshot.notice.as_deref(), Some(READY_NOTICE));
        assert!(snapshot.download_ready());
    }

    #[test]
    fn failed_uses_server_error() {
        let mut snapshot = polling();
        let mut job = ReportJob::new("abc", JobStatus::Failed);
        job.error = Some("template rendering error".into());

        assert_eq!(snapshot.apply_status(job), PollOutcome::Stop);
        assert_eq!(snapshot.phase, JobPhase::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("template rendering error"));
    }

    #[test]
    fn failed_without_error_uses_fallback() {
        let mut snapshot = polling();
        let mut job = ReportJob::new("abc", JobStatus::Failed);
        job.error = Some("  ".into());

        snapshot.apply_status(job);
        assert_eq!(snapshot.error.as_deref(), Some(JOB_FAILED_FALLBACK));
    }

    #[test]
    fn submission_failure_returns_to_idle() {
        let mut snapshot = JobSnapshot::default();
        snapshot.begin_submission("123 Main St");
        snapshot.submission_failed("Request failed with status 500".into());

        assert_eq!(snapshot.phase, JobPhase::Idle);
        assert_eq!(snapshot.job_id, None);
        assert_eq!(snapshot.progress, None);
        assert_eq!(snapshot.error.as_deref(), Some("Request failed with status 500"));
    }

    #[test]
    fn unknown_status_is_reported_verbatim() {
        let job = ReportJob::new("abc", JobStatus::Other("rendering".into()));
        assert_eq!(progress_message(&job), "Status: rendering (selected audits)");
    }
}
