use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use audit_api_client::DEFAULT_API_PATH;
use report_jobs::{ControllerConfig, DEFAULT_POLL_INTERVAL};

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_path: String,
    pub poll_interval: Duration,
    pub poll_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let poll_interval = match lookup("REPORT_POLL_INTERVAL_MS") {
            Some(ms) => Duration::from_millis(
                ms.trim()
                    .parse()
                    .context("REPORT_POLL_INTERVAL_MS must be a number of milliseconds")?,
            ),
            None => DEFAULT_POLL_INTERVAL,
        };
        anyhow::ensure!(
            !poll_interval.is_zero(),
            "REPORT_POLL_INTERVAL_MS must be greater than zero"
        );

        let poll_timeout = lookup("REPORT_POLL_TIMEOUT_SECS")
            .filter(|secs| !secs.trim().is_empty())
            .map(|secs| {
                secs.trim()
                    .parse()
                    .map(Duration::from_secs)
                    .context("REPORT_POLL_TIMEOUT_SECS must be a number of seconds")
            })
            .transpose()?;

        Ok(Self {
            api_base_url: lookup("AUDIT_API_BASE_URL")
                .filter(|url| !url.trim().is_empty())
                .context("AUDIT_API_BASE_URL must be set")?,
            api_path: lookup("AUDIT_API_PATH").unwrap_or_else(|| DEFAULT_API_PATH.to_string()),
            poll_interval,
            poll_timeout,
        })
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            poll_interval: self.poll_interval,
            poll_timeout: self.poll_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_base_url_is_set() {
        let config = load(&[("AUDIT_API_BASE_URL", "https://audits.example.com")]).unwrap();

        assert_eq!(config.api_path, "/webhook");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.poll_timeout, None);
    }

    #[test]
    fn base_url_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("AUDIT_API_BASE_URL"));
    }

    #[test]
    fn poll_settings_are_parsed() {
        let config = load(&[
            ("AUDIT_API_BASE_URL", "https://audits.example.com"),
            ("REPORT_POLL_INTERVAL_MS", "250"),
            ("REPORT_POLL_TIMEOUT_SECS", "600"),
        ])
        .unwrap();

        let controller = config.controller_config();
        assert_eq!(controller.poll_interval, Duration::from_millis(250));
        assert_eq!(controller.poll_timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn malformed_interval_is_rejected() {
        let err = load(&[
            ("AUDIT_API_BASE_URL", "https://audits.example.com"),
            ("REPORT_POLL_INTERVAL_MS", "soon"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("REPORT_POLL_INTERVAL_MS"));

        assert!(load(&[
            ("AUDIT_API_BASE_URL", "https://audits.example.com"),
            ("REPORT_POLL_INTERVAL_MS", "0"),
        ])
        .is_err());
    }
}
