// Infrastructure trait for the report service.
//
// The controller only needs these three calls. `AuditApiClient` is the real
// implementation; `testing::MockReportService` scripts responses for tests.

use async_trait::async_trait;
use audit_api_client::{
    AuditApiClient, CreateReportJob, DownloadedReport, ReportJob, ReportJobCreated, Result,
};

#[async_trait]
pub trait BaseReportService: Send + Sync {
    /// Queue a report job and return its id.
    async fn create_report_job(&self, payload: &CreateReportJob) -> Result<ReportJobCreated>;

    /// Fetch the current status of a job.
    async fn fetch_report_job(&self, job_id: &str) -> Result<ReportJob>;

    /// Download the rendered artifact of a completed job.
    async fn download_report(&self, job_id: &str) -> Result<DownloadedReport>;
}

#[async_trait]
impl BaseReportService for AuditApiClient {
    async fn create_report_job(&self, payload: &CreateReportJob) -> Result<ReportJobCreated> {
        AuditApiClient::create_report_job(self, payload).await
    }

    async fn fetch_report_job(&self, job_id: &str) -> Result<ReportJob> {
        AuditApiClient::fetch_report_job(self, job_id).await
    }

    async fn download_report(&self, job_id: &str) -> Result<DownloadedReport> {
        AuditApiClient::download_report(self, job_id).await
    }
}
