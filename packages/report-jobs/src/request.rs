//! Report submission requests and their local validation.
//!
//! Validation runs before any network call. A request that fails here never
//! reaches the report service.

use std::sync::LazyLock;

use audit_api_client::CreateReportJob;
use regex::Regex;
use thiserror::Error;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Cover-page details printed on the first page of the report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverPage {
    pub building_owner: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub contact_name: String,
    pub contact_email: String,
}

/// Which audit visits a report draws from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VisitScope {
    /// The location's entire audit history.
    #[default]
    All,
    /// Only the listed visit ids.
    Selected(Vec<String>),
}

impl VisitScope {
    pub fn include_all_visits(&self) -> bool {
        matches!(self, VisitScope::All)
    }
}

/// A request to generate one report (or deficiency list) for a location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportRequest {
    pub address: String,
    pub location_id: Option<i64>,
    pub cover: CoverPage,
    pub notes: Option<String>,
    pub recommendations: Option<String>,
    pub deficiency_only: bool,
    pub visits: VisitScope,
}

/// Reasons a request is rejected before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Address is required")]
    MissingAddress,

    #[error("Please complete all cover page fields (missing: {}).", .0.join(", "))]
    IncompleteCoverPage(Vec<&'static str>),

    #[error("Please provide a valid contact email address.")]
    InvalidEmail,

    #[error("Select at least one visit to include in the report.")]
    NoVisitsSelected,
}

impl ReportRequest {
    /// Check the request and build the trimmed wire payload.
    pub fn validate(&self) -> Result<CreateReportJob, ValidationError> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(ValidationError::MissingAddress);
        }

        let cover = &self.cover;
        let fields = [
            ("building owner", cover.building_owner.trim()),
            ("street", cover.street.trim()),
            ("city", cover.city.trim()),
            ("state", cover.state.trim()),
            ("zip", cover.zip.trim()),
            ("contact name", cover.contact_name.trim()),
            ("contact email", cover.contact_email.trim()),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::IncompleteCoverPage(missing));
        }

        let email = cover.contact_email.trim();
        if !EMAIL_PATTERN.is_match(email) {
            return Err(ValidationError::InvalidEmail);
        }

        let visit_ids = match &self.visits {
            VisitScope::All => None,
            VisitScope::Selected(ids) => {
                let ids: Vec<String> = ids
                    .iter()
                    .map(|id| id.trim())
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect();
                if ids.is_empty() {
                    return Err(ValidationError::NoVisitsSelected);
                }
                Some(ids)
            }
        };

        Ok(CreateReportJob {
            address: address.to_string(),
            location_id: self.location_id,
            cover_building_owner: Some(cover.building_owner.trim().to_string()),
            cover_street: Some(cover.street.trim().to_string()),
            cover_city: Some(cover.city.trim().to_string()),
            cover_state: Some(cover.state.trim().to_string()),
            cover_zip: Some(cover.zip.trim().to_string()),
            cover_contact_name: Some(cover.contact_name.trim().to_string()),
            cover_contact_email: Some(email.to_string()),
            notes: non_blank(self.notes.as_deref()),
            recommendations: non_blank(self.recommendations.as_deref()),
            deficiency_only: self.deficiency_only.then_some(true),
            visit_ids,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
