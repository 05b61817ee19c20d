//! Application context with shared state and output helpers

use std::sync::Arc;

use audit_api_client::AuditApiClient;
use console::style;
use report_jobs::ReportJobController;

use crate::config::Config;

/// Application context passed to all commands
pub struct AppContext {
    pub quiet: bool,
    pub config: Config,
    pub client: AuditApiClient,
}

impl AppContext {
    pub fn new(config: Config, quiet: bool) -> Self {
        let client = AuditApiClient::new(&config.api_base_url).with_api_path(&config.api_path);
        Self {
            quiet,
            config,
            client,
        }
    }

    /// A fresh controller for one report workflow.
    pub fn controller(&self) -> ReportJobController {
        ReportJobController::with_config(
            Arc::new(self.client.clone()),
            self.config.controller_config(),
        )
    }

    pub fn print_header(&self, msg: &str) {
        if !self.quiet {
            println!();
            println!("{}", style(msg).bold());
        }
    }

    pub fn print_success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).green());
        }
    }

    pub fn print_warning(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).yellow());
        }
    }

    pub fn print_info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).cyan());
        }
    }

    /// Aligned `label: value` line.
    pub fn print_field(&self, label: &str, value: impl std::fmt::Display) {
        println!("  {:<18} {}", style(format!("{label}:")).dim(), value);
    }
}
