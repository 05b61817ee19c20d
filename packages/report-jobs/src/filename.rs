//! Naming downloaded report artifacts.

use std::sync::LazyLock;

use audit_api_client::DownloadedReport;
use bytes::Bytes;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

const MAX_SLUG_LEN: usize = 64;

/// A downloaded artifact ready to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedArtifact {
    pub job_id: String,
    pub bytes: Bytes,
    pub filename: String,
    pub content_type: Option<String>,
}

impl DownloadedArtifact {
    /// Name a raw download, falling back to the location address when the
    /// server did not send a filename.
    pub fn from_report(job_id: &str, report: DownloadedReport, address: &str) -> Self {
        let filename = resolve_filename(
            report.filename.as_deref(),
            report.content_type.as_deref(),
            address,
        );
        Self {
            job_id: job_id.to_string(),
            bytes: report.body,
            filename,
            content_type: report.content_type,
        }
    }
}

/// The server's filename if it sent one, else `audit-report-{slug}.{ext}`.
pub fn resolve_filename(
    server_filename: Option<&str>,
    content_type: Option<&str>,
    address: &str,
) -> String {
    match server_filename.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => format!(
            "audit-report-{}.{}",
            slugify(address),
            extension_for(content_type)
        ),
    }
}

/// `zip` unless the content type says pdf. Unknown and missing types get
/// `zip` too.
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some(ct) if ct.contains("zip") => "zip",
        Some(ct) if ct.contains("pdf") => "pdf",
        _ => "zip",
    }
}

/// Lowercase ASCII slug, at most 64 characters, `report` when nothing is left.
pub fn slugify(value: &str) -> String {
    let normalized: String = value.to_lowercase().nfkd().collect();
    let dashed = NON_ALPHANUMERIC.replace_all(&normalized, "-");
    let slug: String = dashed.trim_matches('-').chars().take(MAX_SLUG_LEN).collect();

    if slug.is_empty() {
        "report".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_filename_wins() {
        assert_eq!(
            resolve_filename(Some("audit.pdf"), Some("application/zip"), "123 Main St"),
            "audit.pdf"
        );
    }

    #[test]
    fn zip_content_type_without_header() {
        let name = resolve_filename(None, Some("application/zip"), "123 Main St");
        assert_eq!(name, "audit-report-123-main-st.zip");
    }

    #[test]
    fn pdf_content_type_without_header() {
        assert_eq!(
            resolve_filename(Some("  "), Some("application/pdf"), "Unit 4B"),
            "audit-report-unit-4b.pdf"
        );
    }

    #[test]
    fn unknown_content_type_defaults_to_zip() {
        assert_eq!(extension_for(Some("application/octet-stream")), "zip");
        assert_eq!(extension_for(None), "zip");
    }

    #[test]
    fn slug_strips_accents_and_punctuation() {
        assert_eq!(slugify("  Café Plaza, #12 "), "cafe-plaza-12");
    }

    #[test]
    fn empty_slug_falls_back() {
        assert_eq!(slugify("!!!"), "report");
        assert_eq!(slugify(""), "report");
    }

    #[test]
    fn slug_is_truncated() {
        let long = "a".repeat(100);
        assert_eq!(slugify(&long).len(), 64);
    }

    #[test]
    fn artifact_takes_content_type_from_report() {
        let report = DownloadedReport {
            body: Bytes::from_static(b"PK\x03\x04"),
            filename: None,
            content_type: Some("application/zip".into()),
        };
        let artifact = DownloadedArtifact::from_report("abc", report, "1 Elm Ave");

        assert_eq!(artifact.job_id, "abc");
        assert_eq!(artifact.filename, "audit-report-1-elm-ave.zip");
        assert_eq!(artifact.bytes.len(), 4);
    }
}
