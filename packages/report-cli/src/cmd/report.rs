//! Report job commands: submit and watch, status, download

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use report_jobs::state::{scope_label, JOB_FAILED_FALLBACK};
use report_jobs::{CoverPage, DownloadedArtifact, JobPhase, JobSnapshot, ReportRequest, VisitScope};
use tokio::sync::watch;

use crate::context::AppContext;
use crate::utils::{format_file_size, format_timestamp, or_dash, save_artifact};

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Location address the report is for
    pub address: String,

    /// Location row id, when the address alone is ambiguous
    #[arg(long)]
    pub location_id: Option<i64>,

    /// Cover page: building owner
    #[arg(long)]
    pub owner: Option<String>,

    /// Cover page: street
    #[arg(long)]
    pub street: Option<String>,

    /// Cover page: city
    #[arg(long)]
    pub city: Option<String>,

    /// Cover page: state
    #[arg(long)]
    pub state: Option<String>,

    /// Cover page: zip code
    #[arg(long)]
    pub zip: Option<String>,

    /// Cover page: contact name
    #[arg(long)]
    pub contact_name: Option<String>,

    /// Cover page: contact email
    #[arg(long)]
    pub contact_email: Option<String>,

    /// Free-text notes for the report
    #[arg(long)]
    pub notes: Option<String>,

    /// Recommendations section text
    #[arg(long)]
    pub recommendations: Option<String>,

    /// Generate only the deficiency list
    #[arg(long)]
    pub deficiency_only: bool,

    /// Include only this visit (repeatable). Omit to cover the full history.
    #[arg(long = "visit", value_name = "VISIT_ID")]
    pub visits: Vec<String>,

    /// Directory to save the artifact into
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Wait for completion but do not download
    #[arg(long)]
    pub no_download: bool,
}

impl SubmitArgs {
    pub fn to_request(&self) -> ReportRequest {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        ReportRequest {
            address: self.address.clone(),
            location_id: self.location_id,
            cover: CoverPage {
                building_owner: field(&self.owner),
                street: field(&self.street),
                city: field(&self.city),
                state: field(&self.state),
                zip: field(&self.zip),
                contact_name: field(&self.contact_name),
                contact_email: field(&self.contact_email),
            },
            notes: self.notes.clone(),
            recommendations: self.recommendations.clone(),
            deficiency_only: self.deficiency_only,
            visits: if self.visits.is_empty() {
                VisitScope::All
            } else {
                VisitScope::Selected(self.visits.clone())
            },
        }
    }
}

/// Submit a report, follow it to a terminal state, then save the artifact.
pub async fn submit(ctx: &AppContext, args: SubmitArgs) -> Result<()> {
    let request = args.to_request();
    let controller = ctx.controller();

    ctx.print_header(&format!("Generating report for {}", request.address.trim()));
    let job_id = controller.submit(&request).await?;
    ctx.print_info(&format!("Job {} created", job_id));

    let settled = tokio::select! {
        settled = watch_until_settled(ctx, controller.subscribe()) => settled?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            controller.cancel_polling();
            ctx.print_warning(&format!(
                "Stopped watching. The job keeps running; check it with `reportctl status {}`",
                job_id
            ));
            return Ok(());
        }
    };

    if settled.phase == JobPhase::Failed {
        anyhow::bail!(
            "{}",
            settled.error.as_deref().unwrap_or(JOB_FAILED_FALLBACK)
        );
    }
    if let Some(notice) = &settled.notice {
        ctx.print_success(notice);
    }

    if args.no_download {
        ctx.print_info(&format!("Download it with `reportctl download {}`", job_id));
        return Ok(());
    }

    let artifact = controller.download(&job_id).await?;
    report_saved(ctx, &args.out, &artifact)
}

/// Print each new progress line until the job completes or fails.
async fn watch_until_settled(
    ctx: &AppContext,
    mut updates: watch::Receiver<JobSnapshot>,
) -> Result<JobSnapshot> {
    let mut last_progress: Option<String> = None;

    loop {
        let snapshot = updates.borrow_and_update().clone();
        if snapshot.progress.is_some() && snapshot.progress != last_progress {
            if let Some(progress) = &snapshot.progress {
                ctx.print_info(progress);
            }
            last_progress = snapshot.progress.clone();
        }
        if snapshot.phase.is_terminal() {
            return Ok(snapshot);
        }

        updates
            .changed()
            .await
            .context("report controller shut down while polling")?;
    }
}

pub async fn status(ctx: &AppContext, job_id: &str) -> Result<()> {
    let job = ctx
        .client
        .fetch_report_job(job_id)
        .await
        .with_context(|| format!("failed to fetch report job {}", job_id))?;

    ctx.print_header(&format!("Report job {}", job.job_id));
    let status = match job.status.as_str() {
        "completed" => style(job.status.to_string()).green(),
        "failed" => style(job.status.to_string()).red(),
        _ => style(job.status.to_string()).yellow(),
    };
    ctx.print_field("Status", status);
    ctx.print_field("Address", or_dash(job.address.as_deref()));
    ctx.print_field(
        "Type",
        if job.deficiency_only {
            "Deficiency list"
        } else {
            "Full report"
        },
    );
    ctx.print_field("Scope", scope_label(&job));
    ctx.print_field("Created", format_timestamp(job.created_at.as_deref()));
    ctx.print_field("Started", format_timestamp(job.started_at.as_deref()));
    ctx.print_field("Completed", format_timestamp(job.completed_at.as_deref()));
    if let Some(version) = job.version {
        ctx.print_field("Version", version);
    }
    if let Some(filename) = &job.artifact_filename {
        let size = job
            .artifact_size
            .map(|bytes| format!(" ({})", format_file_size(bytes)))
            .unwrap_or_default();
        ctx.print_field("Artifact", format!("{}{}", filename, size));
    }
    if let Some(error) = &job.error {
        ctx.print_field("Error", style(error).red());
    }
    if job.download_ready {
        ctx.print_success(&format!("Ready: reportctl download {}", job.job_id));
    }
    Ok(())
}

pub async fn download(
    ctx: &AppContext,
    job_id: &str,
    address: Option<&str>,
    out: &Path,
) -> Result<()> {
    let report = ctx
        .client
        .download_report(job_id)
        .await
        .with_context(|| format!("failed to download report {}", job_id))?;
    let artifact = DownloadedArtifact::from_report(job_id, report, address.unwrap_or_default());
    report_saved(ctx, out, &artifact)
}

fn report_saved(ctx: &AppContext, out: &Path, artifact: &DownloadedArtifact) -> Result<()> {
    let path = save_artifact(out, artifact)?;
    ctx.print_success(&format!(
        "Saved {} ({})",
        path.display(),
        format_file_size(artifact.bytes.len() as u64)
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: SubmitArgs,
    }

    fn parse(argv: &[&str]) -> SubmitArgs {
        let mut full = vec!["reportctl"];
        full.extend_from_slice(argv);
        Harness::try_parse_from(full).unwrap().args
    }

    #[test]
    fn no_visit_flags_covers_full_history() {
        let request = parse(&["12 Elm St", "--owner", "Acme"]).to_request();

        assert_eq!(request.address, "12 Elm St");
        assert_eq!(request.cover.building_owner, "Acme");
        assert_eq!(request.cover.city, "");
        assert!(request.visits.include_all_visits());
        assert!(!request.deficiency_only);
    }

    #[test]
    fn repeated_visit_flags_select_visits() {
        let args = parse(&[
            "12 Elm St",
            "--visit",
            "v1",
            "--visit",
            "v2",
            "--deficiency-only",
            "--out",
            "reports",
        ]);
        let request = args.to_request();

        assert_eq!(
            request.visits,
            VisitScope::Selected(vec!["v1".to_string(), "v2".to_string()])
        );
        assert!(request.deficiency_only);
        assert_eq!(args.out, PathBuf::from("reports"));
    }

    #[test]
    fn missing_cover_fields_fail_validation_before_any_request() {
        let request = parse(&["12 Elm St", "--owner", "Acme"]).to_request();
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("Please complete all cover page fields"));
    }
}
