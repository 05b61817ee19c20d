//! Shared formatting and file helpers

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use report_jobs::DownloadedArtifact;

const SIZE_UNITS: [&str; 5] = ["bytes", "KB", "MB", "GB", "TB"];

/// Human-readable size: `512 bytes`, `1.5 KB`, `12 MB`.
pub fn format_file_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} bytes", bytes)
    } else if value >= 10.0 {
        format!("{:.0} {}", value, SIZE_UNITS[unit])
    } else {
        format!("{:.1} {}", value, SIZE_UNITS[unit])
    }
}

/// Render a server timestamp in local time. Unparseable values are shown
/// as sent; missing ones as `-`.
pub fn format_timestamp(value: Option<&str>) -> String {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return "-".to_string();
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed
            .with_timezone(&Local)
            .format("%b %-d, %Y %H:%M")
            .to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return parsed.format("%b %-d, %Y %H:%M").to_string();
    }
    raw.to_string()
}

/// `value` or `-` when missing or blank.
pub fn or_dash(value: Option<&str>) -> &str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or("-")
}

/// Write an artifact into `dir`, creating it if needed.
///
/// Only the final path component of the artifact's filename is used.
pub fn save_artifact(dir: &Path, artifact: &DownloadedArtifact) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let name = Path::new(&artifact.filename)
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| format!("audit-report-{}.zip", artifact.job_id).into());
    let path = dir.join(name);

    fs::write(&path, &artifact.bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_api_client::DownloadedReport;

    fn artifact(filename: Option<&str>) -> DownloadedArtifact {
        let report = DownloadedReport {
            body: b"PK\x03\x04".to_vec().into(),
            filename: filename.map(str::to_string),
            content_type: Some("application/zip".to_string()),
        };
        DownloadedArtifact::from_report("job-7", report, "12 Elm St")
    }

    #[test]
    fn file_sizes_scale_through_units() {
        assert_eq!(format_file_size(0), "0 bytes");
        assert_eq!(format_file_size(512), "512 bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(12 * 1024 * 1024), "12 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn timestamps_fall_back_to_raw_text() {
        assert_eq!(format_timestamp(None), "-");
        assert_eq!(format_timestamp(Some("  ")), "-");
        assert_eq!(format_timestamp(Some("last tuesday")), "last tuesday");
        assert_eq!(
            format_timestamp(Some("2024-03-05 14:07:00")),
            "Mar 5, 2024 14:07"
        );
        assert!(format_timestamp(Some("2024-03-05T14:07:00Z")).contains("2024"));
    }

    #[test]
    fn artifact_is_written_under_its_own_name() {
        let dir = std::env::temp_dir().join(format!("reportctl-save-{}", std::process::id()));
        let saved = save_artifact(&dir, &artifact(Some("../../etc/owner-report.zip"))).unwrap();

        assert_eq!(saved, dir.join("owner-report.zip"));
        assert_eq!(fs::read(&saved).unwrap(), b"PK\x03\x04");

        let fallback = save_artifact(&dir, &artifact(None)).unwrap();
        assert_eq!(fallback, dir.join("audit-report-12-elm-st.zip"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
