//! REST client for the elevator audit reporting API.
//!
//! A minimal client for the audit service. Supports queuing report jobs,
//! polling their status, downloading rendered artifacts, browsing locations
//! and audits, and toggling deficiency status. All aggregation and rendering
//! happens server-side.
//!
//! # Example
//!
//! ```rust,ignore
//! use audit_api_client::{AuditApiClient, LocationListParams};
//!
//! let client = AuditApiClient::from_env()?;
//!
//! let page = client
//!     .fetch_locations(&LocationListParams { search: Some("Main".into()), ..Default::default() })
//!     .await?;
//! for location in &page.items {
//!     println!("{} ({} open deficiencies)", location.address, location.open_deficiencies);
//! }
//! ```

pub mod download;
pub mod error;
pub mod types;

pub use download::{extract_filename, DownloadedReport};
pub use error::{ApiError, Result};
pub use types::*;

use std::sync::LazyLock;

use regex::Regex;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use types::{DeficiencyUpdateBody, ErrorBody};

/// Path prefix the API is mounted under when none is configured.
pub const DEFAULT_API_PATH: &str = "/webhook";

const DOWNLOAD_ACCEPT: &str = "application/zip, application/pdf;q=0.9, */*;q=0.5";

static DUPLICATE_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^:]/)/+").expect("slash pattern is valid"));

/// Audit API client.
#[derive(Clone)]
pub struct AuditApiClient {
    http_client: Client,
    base_url: String,
    api_path: String,
}

impl AuditApiClient {
    /// Create a client for the API at `base_url`, mounted under `/webhook`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http_client: Client::new(),
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_path: normalize_api_path(DEFAULT_API_PATH),
        }
    }

    /// Create from environment variables `AUDIT_API_BASE_URL` and
    /// optionally `AUDIT_API_PATH`.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("AUDIT_API_BASE_URL")
            .map_err(|_| ApiError::Config("AUDIT_API_BASE_URL not set".into()))?;
        if base_url.trim().is_empty() {
            return Err(ApiError::Config("AUDIT_API_BASE_URL is empty".into()));
        }

        let client = Self::new(base_url);
        Ok(match std::env::var("AUDIT_API_PATH") {
            Ok(path) => client.with_api_path(path),
            Err(_) => client,
        })
    }

    /// Set the path prefix the API is mounted under. `"/"` means no prefix.
    pub fn with_api_path(mut self, path: impl AsRef<str>) -> Self {
        self.api_path = normalize_api_path(path.as_ref());
        self
    }

    /// Use a preconfigured reqwest client (timeouts, proxies, etc.).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the normalized API path prefix.
    pub fn api_path(&self) -> &str {
        &self.api_path
    }

    /// Full URL for an API path such as `/reports`.
    pub fn url(&self, path: &str) -> String {
        build_url(&self.base_url, &self.api_path, path)
    }

    // =========================================================================
    // Report jobs
    // =========================================================================

    /// Queue a report job. Returns immediately with the assigned job id.
    pub async fn create_report_job(&self, payload: &CreateReportJob) -> Result<ReportJobCreated> {
        let address = payload.address.trim();
        if address.is_empty() {
            return Err(ApiError::InvalidRequest("Address is required".into()));
        }

        debug!(address, deficiency_only = ?payload.deficiency_only, "Queuing report job");

        let request = self
            .http_client
            .post(self.url("/reports"))
            .header(header::ACCEPT, "application/json")
            .json(payload);

        self.send_json(request).await
    }

    /// Fetch the current status of a report job.
    pub async fn fetch_report_job(&self, job_id: &str) -> Result<ReportJob> {
        let request = self
            .http_client
            .get(self.url(&report_path(job_id)))
            .header(header::ACCEPT, "application/json");

        self.send_json(request).await
    }

    /// Download the rendered artifact of a completed report job.
    pub async fn download_report(&self, job_id: &str) -> Result<DownloadedReport> {
        let url = self.url(&format!("{}/download", report_path(job_id)));
        let resp = self
            .http_client
            .get(&url)
            .header(header::ACCEPT, DOWNLOAD_ACCEPT)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let content_type = header_str(&resp, header::CONTENT_TYPE);
        let filename =
            header_str(&resp, header::CONTENT_DISPOSITION).and_then(|v| extract_filename(&v));
        let body = resp.bytes().await?;

        debug!(job_id, bytes = body.len(), ?filename, "Downloaded report artifact");

        Ok(DownloadedReport {
            body,
            filename,
            content_type,
        })
    }

    // =========================================================================
    // Locations and audits
    // =========================================================================

    /// List locations, paginated and optionally filtered by a search term.
    pub async fn fetch_locations(&self, params: &LocationListParams) -> Result<LocationListResponse> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(page) = params.page.filter(|p| *p > 0) {
            query.push(("page", page.to_string()));
        }
        if let Some(page_size) = params.page_size.filter(|p| *p > 0) {
            query.push(("page_size", page_size.to_string()));
        }
        if let Some(search) = params.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                query.push(("search", search.to_string()));
            }
        }

        let request = self
            .http_client
            .get(self.url("/locations"))
            .header(header::ACCEPT, "application/json")
            .query(&query);

        self.send_json(request).await
    }

    /// Fetch the detail view of one location, including its report versions.
    pub async fn fetch_location_detail(
        &self,
        address: &str,
        location_id: Option<i64>,
    ) -> Result<LocationDetail> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if !address.is_empty() {
            query.push(("address", address.to_string()));
        }
        if let Some(id) = location_id {
            query.push(("location_id", id.to_string()));
        }

        let request = self
            .http_client
            .get(self.url("/locations"))
            .header(header::ACCEPT, "application/json")
            .query(&query);

        self.send_json(request).await
    }

    /// Fetch one audit with its deficiencies and photos.
    pub async fn fetch_audit_detail(&self, audit_id: &str) -> Result<AuditDetail> {
        let request = self
            .http_client
            .get(self.url(&audit_path(audit_id)))
            .header(header::ACCEPT, "application/json");

        self.send_json(request).await
    }

    /// Mark a deficiency resolved or reopen it.
    pub async fn update_deficiency_status(
        &self,
        audit_id: &str,
        deficiency_id: i64,
        resolved: bool,
    ) -> Result<DeficiencyUpdate> {
        debug!(audit_id, deficiency_id, resolved, "Updating deficiency status");

        let request = self
            .http_client
            .patch(self.url(&format!(
                "{}/deficiencies/{}",
                audit_path(audit_id),
                deficiency_id
            )))
            .header(header::ACCEPT, "application/json")
            .json(&DeficiencyUpdateBody { resolved });

        self.send_json(request).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = request.send().await?;
        let resp = check_status(resp).await?;
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

// Ids are percent-encoded so they always stay a single path segment.
fn report_path(job_id: &str) -> String {
    format!("/reports/{}", urlencoding::encode(job_id))
}

fn audit_path(audit_id: &str) -> String {
    format!("/audits/{}", urlencoding::encode(audit_id))
}

/// Turn a non-2xx response into `ApiError::Api`.
async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Api {
        status: status.as_u16(),
        message: error_message(status.as_u16(), &body),
    })
}

fn header_str(resp: &Response, name: header::HeaderName) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// The server's `message` field when present and non-blank, otherwise a
/// generic status line.
pub fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status {}", status))
}

fn normalize_api_path(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut path = if trimmed.is_empty() {
        DEFAULT_API_PATH.to_string()
    } else {
        trimmed.to_string()
    };
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    if path.ends_with('/') {
        path.pop();
    }
    path
}

fn build_url(base_url: &str, api_path: &str, path: &str) -> String {
    let joined: String = [base_url, api_path, path]
        .iter()
        .filter(|segment| !segment.is_empty())
        .copied()
        .collect();
    DUPLICATE_SLASHES.replace_all(&joined, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_includes_default_prefix() {
        let client = AuditApiClient::new("https://audits.example.com/");
        assert_eq!(
            client.url("/reports/abc"),
            "https://audits.example.com/webhook/reports/abc"
        );
    }

    #[test]
    fn api_path_is_normalized() {
        assert_eq!(normalize_api_path("api/v1/"), "/api/v1");
        assert_eq!(normalize_api_path("  "), "/webhook");
        assert_eq!(normalize_api_path("/"), "");
    }

    #[test]
    fn root_api_path_means_no_prefix() {
        let client = AuditApiClient::new("http://localhost:8080").with_api_path("/");
        assert_eq!(client.url("/locations"), "http://localhost:8080/locations");
    }

    #[test]
    fn duplicate_slashes_collapse_but_scheme_survives() {
        assert_eq!(
            build_url("http://host//", "/api", "//reports"),
            "http://host/api/reports"
        );
    }

    #[test]
    fn relative_base_keeps_path_only() {
        let client = AuditApiClient::new("");
        assert_eq!(client.url("/reports"), "/webhook/reports");
    }

    #[test]
    fn ids_are_encoded_as_single_segments() {
        let client = AuditApiClient::new("https://audits.example.com");
        assert_eq!(
            client.url(&report_path("job 1/../x")),
            "https://audits.example.com/webhook/reports/job%201%2F..%2Fx"
        );
        assert_eq!(
            client.url(&audit_path("a?b#c")),
            "https://audits.example.com/webhook/audits/a%3Fb%23c"
        );
        assert_eq!(report_path("3f2a-91"), "/reports/3f2a-91");
    }

    #[test]
    fn error_message_prefers_server_message() {
        assert_eq!(
            error_message(422, r#"{"message":"cover_zip is invalid"}"#),
            "cover_zip is invalid"
        );
    }

    #[test]
    fn error_message_falls_back_to_status() {
        assert_eq!(error_message(500, r#"{"message":"   "}"#), "Request failed with status 500");
        assert_eq!(error_message(502, "<html>bad gateway</html>"), "Request failed with status 502");
        assert_eq!(error_message(404, ""), "Request failed with status 404");
    }

    #[test]
    fn api_error_displays_bare_message() {
        let err = ApiError::Api {
            status: 409,
            message: "Report already running".into(),
        };
        assert_eq!(err.to_string(), "Report already running");
        assert_eq!(err.status(), Some(409));
    }
}
