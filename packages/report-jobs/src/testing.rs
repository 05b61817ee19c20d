// MockReportService - scripted report service for testing
//
// Responses are queued per endpoint. The last queued response repeats once
// the queue is down to one entry, so a job can be left "queued" forever.
// Every call is recorded for assertions.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use audit_api_client::{
    ApiError, CreateReportJob, DownloadedReport, JobStatus, ReportJob, ReportJobCreated, Result,
};
use bytes::Bytes;
use tokio::sync::Semaphore;

use crate::service::BaseReportService;

pub struct MockReportService {
    create_responses: Arc<Mutex<VecDeque<Result<ReportJobCreated>>>>,
    status_responses: Arc<Mutex<VecDeque<Result<ReportJob>>>>,
    download_responses: Arc<Mutex<VecDeque<Result<DownloadedReport>>>>,
    create_calls: Arc<Mutex<Vec<CreateReportJob>>>,
    status_calls: Arc<Mutex<Vec<String>>>,
    download_calls: Arc<Mutex<Vec<String>>>,
    create_delay: Option<Duration>,
    status_gate: Option<Arc<Semaphore>>,
}

impl Default for MockReportService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockReportService {
    pub fn new() -> Self {
        Self {
            create_responses: Arc::new(Mutex::new(VecDeque::new())),
            status_responses: Arc::new(Mutex::new(VecDeque::new())),
            download_responses: Arc::new(Mutex::new(VecDeque::new())),
            create_calls: Arc::new(Mutex::new(Vec::new())),
            status_calls: Arc::new(Mutex::new(Vec::new())),
            download_calls: Arc::new(Mutex::new(Vec::new())),
            create_delay: None,
            status_gate: None,
        }
    }

    /// Job creation succeeds with this id.
    pub fn with_created(self, job_id: &str) -> Self {
        self.create_responses.lock().unwrap().push_back(Ok(ReportJobCreated {
            status: "queued".to_string(),
            job_id: job_id.to_string(),
            address: None,
        }));
        self
    }

    /// Job creation is rejected by the server.
    pub fn with_create_error(self, status: u16, message: &str) -> Self {
        self.create_responses.lock().unwrap().push_back(Err(ApiError::Api {
            status,
            message: message.to_string(),
        }));
        self
    }

    /// Job creation takes this long to answer.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    /// Each status request is recorded, then waits for a permit from `gate`
    /// before answering.
    pub fn with_status_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.status_gate = Some(gate);
        self
    }

    /// Next status response. The job id is replaced with the one polled.
    pub fn with_status(self, job: ReportJob) -> Self {
        self.status_responses.lock().unwrap().push_back(Ok(job));
        self
    }

    /// Next status request fails at the transport level.
    pub fn with_poll_error(self, message: &str) -> Self {
        self.status_responses
            .lock()
            .unwrap()
            .push_back(Err(ApiError::Network(message.to_string())));
        self
    }

    pub fn with_download(self, report: DownloadedReport) -> Self {
        self.download_responses.lock().unwrap().push_back(Ok(report));
        self
    }

    pub fn with_download_error(self, status: u16, message: &str) -> Self {
        self.download_responses.lock().unwrap().push_back(Err(ApiError::Api {
            status,
            message: message.to_string(),
        }));
        self
    }

    pub fn create_calls(&self) -> Vec<CreateReportJob> {
        self.create_calls.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> Vec<String> {
        self.status_calls.lock().unwrap().clone()
    }

    pub fn download_calls(&self) -> Vec<String> {
        self.download_calls.lock().unwrap().clone()
    }

    /// Total requests of any kind.
    pub fn request_count(&self) -> usize {
        self.create_calls.lock().unwrap().len()
            + self.status_calls.lock().unwrap().len()
            + self.download_calls.lock().unwrap().len()
    }
}

fn next_response<T: Clone>(queue: &Mutex<VecDeque<Result<T>>>, endpoint: &str) -> Result<T> {
    let mut queue = queue.lock().unwrap();
    match queue.len() {
        0 => Err(ApiError::Network(format!("no scripted {} response", endpoint))),
        1 => queue[0].clone(),
        _ => queue.pop_front().unwrap(),
    }
}

#[async_trait]
impl BaseReportService for MockReportService {
    async fn create_report_job(&self, payload: &CreateReportJob) -> Result<ReportJobCreated> {
        self.create_calls.lock().unwrap().push(payload.clone());
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        next_response(&self.create_responses, "create")
    }

    async fn fetch_report_job(&self, job_id: &str) -> Result<ReportJob> {
        self.status_calls.lock().unwrap().push(job_id.to_string());
        if let Some(gate) = &self.status_gate {
            gate.acquire().await.expect("status gate closed").forget();
        }
        next_response(&self.status_responses, "status").map(|mut job| {
            job.job_id = job_id.to_string();
            job
        })
    }

    async fn download_report(&self, job_id: &str) -> Result<DownloadedReport> {
        self.download_calls.lock().unwrap().push(job_id.to_string());
        next_response(&self.download_responses, "download")
    }
}

// =============================================================================
// Job fixtures
// =============================================================================

pub fn queued_job() -> ReportJob {
    ReportJob::new("", JobStatus::Queued)
}

pub fn processing_job() -> ReportJob {
    ReportJob::new("", JobStatus::Processing)
}

pub fn completed_job() -> ReportJob {
    let mut job = ReportJob::new("", JobStatus::Completed);
    job.download_ready = true;
    job
}

pub fn failed_job(error: Option<&str>) -> ReportJob {
    let mut job = ReportJob::new("", JobStatus::Failed);
    job.error = error.map(str::to_string);
    job
}

/// A zip artifact with an optional `Content-Disposition` filename.
pub fn zip_download(filename: Option<&str>) -> DownloadedReport {
    DownloadedReport {
        body: Bytes::from_static(b"PK\x03\x04"),
        filename: filename.map(str::to_string),
        content_type: Some("application/zip".to_string()),
    }
}
