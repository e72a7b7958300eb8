//! diffharvest CLI entrypoint.
//!
//! Downloads GitHub pull request, GitLab merge request and commit, and Jira
//! epic review artefacts and writes beautified diffs below an output root.

use std::io;
use std::process::ExitCode;

use diffharvest::config::OperationMode;
use diffharvest::review::{HarvestError, HarvestReport};
use diffharvest::HarvestConfig;
use ortho_config::OrthoConfig;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;

/// Environment variable holding the `tracing` filter directives.
const LOG_FILTER_ENV: &str = "DIFFHARVEST_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(report) => {
            tracing::info!(
                succeeded = report.succeeded,
                failed = report.failed.len(),
                files = report.files_written.len(),
                "harvest finished"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::debug!(?error, "harvest aborted");
            if cli::output::write_error(&error).is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<HarvestReport, HarvestError> {
    let config = load_config()?;

    match config.operation_mode() {
        OperationMode::JiraEpic => cli::jira_epic::run(&config).await,
        OperationMode::Review(kind) => cli::review_batch::run(&config, kind).await,
        OperationMode::Unspecified => Err(HarvestError::MissingInput),
    }
}

/// Installs a stderr `tracing` subscriber filtered by `DIFFHARVEST_LOG`,
/// defaulting to warnings only.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`HarvestError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<HarvestConfig, HarvestError> {
    HarvestConfig::load().map_err(|error| HarvestError::Configuration {
        message: error.to_string(),
    })
}
