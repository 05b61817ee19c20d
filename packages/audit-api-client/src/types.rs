use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Report jobs
// =============================================================================

/// Server-reported lifecycle status of a report job.
///
/// Unrecognised strings are kept verbatim so a newer server can add states
/// without breaking older clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Other(raw) => raw,
        }
    }

    /// `completed` and `failed` never change once reported.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "queued" => JobStatus::Queued,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Other(raw),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /reports`.
///
/// Optional fields are omitted from the JSON entirely when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateReportJob {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_building_owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deficiency_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_ids: Option<Vec<String>>,
}

/// Response of `POST /reports`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportJobCreated {
    pub status: String,
    pub job_id: String,
    #[serde(default)]
    pub address: Option<String>,
}

/// Response of `GET /reports/{job_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportJob {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub download_ready: bool,
    #[serde(default)]
    pub deficiency_only: bool,
    #[serde(default)]
    pub include_all: bool,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub artifact_filename: Option<String>,
    #[serde(default)]
    pub artifact_size: Option<u64>,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub selected_audit_count: Option<u32>,
}

impl ReportJob {
    /// A bare job in the given status, with every optional field unset.
    pub fn new(job_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            address: None,
            created_at: None,
            started_at: None,
            completed_at: None,
            error: None,
            download_ready: false,
            deficiency_only: false,
            include_all: false,
            location_id: None,
            artifact_filename: None,
            artifact_size: None,
            version: None,
            download_url: None,
            selected_audit_count: None,
        }
    }
}

// =============================================================================
// Locations
// =============================================================================

/// Query for `GET /locations`. Zero and blank values are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationListResponse {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub items: Vec<LocationSummary>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationSummary {
    #[serde(default)]
    pub location_code: Option<String>,
    #[serde(default)]
    pub location_row_id: Option<i64>,
    pub address: String,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub building_owner: Option<String>,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub device_count: u32,
    #[serde(default)]
    pub open_deficiencies: u32,
}

/// Response of `GET /locations?address=...`.
///
/// Only the parts the client acts on are typed; device tables, service and
/// financial rollups and analytics stay as raw JSON in `extra`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationDetail {
    pub summary: LocationDetailSummary,
    #[serde(default)]
    pub visits: Vec<VisitSummary>,
    #[serde(default)]
    pub reports: Vec<ReportVersion>,
    #[serde(default)]
    pub deficiency_reports: Vec<ReportVersion>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationDetailSummary {
    pub address: String,
    #[serde(default)]
    pub location_row_id: Option<i64>,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub building_owner: Option<String>,
    #[serde(default)]
    pub device_count: u32,
    #[serde(default)]
    pub audit_count: u32,
    #[serde(default)]
    pub total_deficiencies: u32,
    #[serde(default)]
    pub open_deficiencies: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One audit visit at a location; `visit_id` is what report scoping selects on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VisitSummary {
    #[serde(default)]
    pub visit_id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub audit_count: u32,
    #[serde(default)]
    pub device_count: u32,
    #[serde(default)]
    pub open_deficiencies: u32,
}

/// A previously generated report artifact for a location.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportVersion {
    pub job_id: String,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub include_all: Option<bool>,
    #[serde(default)]
    pub selected_count: Option<u32>,
}

// =============================================================================
// Audits and deficiencies
// =============================================================================

/// Response of `GET /audits/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuditDetail {
    pub audit: AuditRecord,
    #[serde(default)]
    pub deficiencies: Vec<Deficiency>,
    #[serde(default)]
    pub photos: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuditRecord {
    pub audit_uuid: String,
    #[serde(default)]
    pub building_address: Option<String>,
    #[serde(default)]
    pub building_owner: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub submitted_on: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Deficiency {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub equipment_code: Option<String>,
    #[serde(default)]
    pub condition_code: Option<String>,
    #[serde(default)]
    pub violation_equipment: Option<String>,
    #[serde(default)]
    pub violation_condition: Option<String>,
    #[serde(default)]
    pub violation_remedy: Option<String>,
    #[serde(default)]
    pub violation_note: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<String>,
}

impl Deficiency {
    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }
}

/// Response of `PATCH /audits/{audit_id}/deficiencies/{deficiency_id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeficiencyUpdate {
    pub status: String,
    pub resolved: bool,
    #[serde(default)]
    pub resolved_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DeficiencyUpdateBody {
    pub resolved: bool,
}

/// Error body the server sends alongside non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
