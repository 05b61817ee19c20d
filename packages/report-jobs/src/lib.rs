//! # Report jobs
//!
//! Client-side lifecycle of asynchronous audit report generation: submit a
//! request, poll the job until the server reports a terminal status, and
//! download the rendered artifact.
//!
//! ## Lifecycle
//!
//! ```text
//! IDLE → SUBMITTING → POLLING → { COMPLETED | FAILED }
//! ```
//!
//! - Requests are validated locally; invalid ones never reach the network.
//! - One status request is made as soon as the job is created, then one per
//!   poll interval (5 s by default). Polls never overlap.
//! - A failed status request ends polling immediately. There is no retry.
//! - Downloads never change the lifecycle phase.
//!
//! ## Observing state
//!
//! The controller publishes a [`JobSnapshot`] through a `tokio::sync::watch`
//! channel. Any UI runtime can render from [`ReportJobController::snapshot`]
//! and redraw when the receiver from [`ReportJobController::subscribe`]
//! changes.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use audit_api_client::AuditApiClient;
//! use report_jobs::{ReportJobController, ReportRequest};
//!
//! let controller = ReportJobController::new(Arc::new(AuditApiClient::from_env()?));
//! let job_id = controller.submit(&request).await?;
//!
//! let mut updates = controller.subscribe();
//! let settled = updates.wait_for(|s| s.phase.is_terminal()).await?.clone();
//! if settled.download_ready() {
//!     let artifact = controller.download(&job_id).await?;
//!     std::fs::write(&artifact.filename, &artifact.bytes)?;
//! }
//! ```

pub mod controller;
pub mod error;
pub mod filename;
pub mod poller;
pub mod request;
pub mod service;
pub mod state;
pub mod testing;

pub use controller::{ControllerConfig, ReportJobController, DEFAULT_POLL_INTERVAL};
pub use error::{ReportJobError, Result};
pub use filename::{resolve_filename, slugify, DownloadedArtifact};
pub use poller::PollHandle;
pub use request::{CoverPage, ReportRequest, ValidationError, VisitScope};
pub use service::BaseReportService;
pub use state::{JobPhase, JobSnapshot, LastDownload, PollOutcome};
