//! Errors returned directly from controller calls.
//!
//! Failures that happen on the poll timer (a broken status request, a job the
//! server marks failed) are not returned from any call. They land in
//! [`JobSnapshot::error`](crate::JobSnapshot) with the phase set to failed.

use audit_api_client::ApiError;
use thiserror::Error;

use crate::request::ValidationError;

pub type Result<T> = std::result::Result<T, ReportJobError>;

/// Every variant displays as the message to show the operator.
#[derive(Debug, Clone, Error)]
pub enum ReportJobError {
    /// Rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("A report submission is already in progress")]
    SubmissionInFlight,

    /// Reset or cancelled while the job was being created. The job, if the
    /// server made one, is not tracked.
    #[error("Report submission was cancelled")]
    Cancelled,

    /// The job could not be created. No job is tracked.
    #[error("{0}")]
    Submission(#[source] ApiError),

    /// The artifact could not be fetched. Job state is unaffected.
    #[error("{0}")]
    Download(#[source] ApiError),
}
