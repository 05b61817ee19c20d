//! Report artifact downloads.

use std::sync::LazyLock;

use bytes::Bytes;
use regex::Regex;

/// Raw artifact returned by `GET /reports/{job_id}/download`.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedReport {
    pub body: Bytes,
    /// Filename announced by the server in `Content-Disposition`, if any.
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

static FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\*=UTF-8''([^;]+)|filename="?([^";]+)"?"#)
        .expect("filename pattern is valid")
});

/// Pull the filename out of a `Content-Disposition` header value.
///
/// The RFC 5987 `filename*=UTF-8''...` form is percent-decoded; if decoding
/// fails the raw value is returned.
pub fn extract_filename(header_value: &str) -> Option<String> {
    let captures = FILENAME_PATTERN.captures(header_value)?;
    let raw = captures.get(1).or_else(|| captures.get(2))?.as_str();

    match urlencoding::decode(raw) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(_) => Some(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_filename() {
        assert_eq!(
            extract_filename(r#"attachment; filename="audit.pdf""#).as_deref(),
            Some("audit.pdf")
        );
    }

    #[test]
    fn unquoted_filename() {
        assert_eq!(
            extract_filename("attachment; filename=report-v2.zip").as_deref(),
            Some("report-v2.zip")
        );
    }

    #[test]
    fn extended_filename_is_percent_decoded() {
        assert_eq!(
            extract_filename("attachment; filename*=UTF-8''123%20Main%20St.zip").as_deref(),
            Some("123 Main St.zip")
        );
    }

    #[test]
    fn header_without_filename() {
        assert_eq!(extract_filename("inline"), None);
    }
}
