//! `reportctl`: generate, download, and browse elevator audit reports.

mod cmd;
mod config;
mod context;
mod utils;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::context::AppContext;

#[derive(Parser)]
#[command(name = "reportctl")]
#[command(about = "Elevator audit reports from the terminal")]
#[command(version)]
struct Cli {
    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log client and poller activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue a report, wait for it to finish, and download it
    Submit(cmd::report::SubmitArgs),

    /// Show the current status of a report job
    Status {
        job_id: String,
    },

    /// Download a completed report
    Download {
        job_id: String,

        /// Address used to name the file when the server sends no name
        #[arg(long)]
        address: Option<String>,

        /// Directory to save the artifact into
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// List locations
    Locations {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long)]
        page_size: Option<u32>,

        /// Filter by address, owner, or site name
        #[arg(long)]
        search: Option<String>,
    },

    /// Show a location with its visits and generated reports
    Location {
        address: String,

        #[arg(long)]
        location_id: Option<i64>,
    },

    /// Show an audit and its deficiencies
    Audit {
        audit_id: String,
    },

    /// Mark a deficiency resolved or reopen it
    #[command(group(ArgGroup::new("state").required(true).args(["resolved", "open"])))]
    Deficiency {
        audit_id: String,
        deficiency_id: i64,

        #[arg(long)]
        resolved: bool,

        #[arg(long)]
        open: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "info,report_jobs=debug,audit_api_client=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::new(Config::from_env()?, cli.quiet);

    match cli.command {
        Commands::Submit(args) => cmd::report::submit(&ctx, args).await,
        Commands::Status { job_id } => cmd::report::status(&ctx, &job_id).await,
        Commands::Download {
            job_id,
            address,
            out,
        } => cmd::report::download(&ctx, &job_id, address.as_deref(), &out).await,
        Commands::Locations {
            page,
            page_size,
            search,
        } => cmd::locations::list(&ctx, page, page_size, search).await,
        Commands::Location {
            address,
            location_id,
        } => cmd::locations::show(&ctx, &address, location_id).await,
        Commands::Audit { audit_id } => cmd::audits::show(&ctx, &audit_id).await,
        Commands::Deficiency {
            audit_id,
            deficiency_id,
            resolved,
            open: _,
        } => cmd::audits::set_status(&ctx, &audit_id, deficiency_id, resolved).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn deficiency_requires_exactly_one_state() {
        assert!(Cli::try_parse_from(["reportctl", "deficiency", "a1", "7"]).is_err());
        assert!(
            Cli::try_parse_from(["reportctl", "deficiency", "a1", "7", "--resolved", "--open"])
                .is_err()
        );

        let cli = Cli::try_parse_from(["reportctl", "deficiency", "a1", "7", "--open"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Deficiency {
                deficiency_id: 7,
                resolved: false,
                ..
            }
        ));
    }
}
