//! cops workload tuner
//!
//! Bulk-applies replica counts and container limits/requests from a CSV batch
//! to Deployments and StatefulSets, verifies each change by reading it back,
//! keeps the tracking label on the workload's pods in line, and reports one
//! row per workload.

mod config;
mod controller;
mod error;
mod input;
mod logging;
mod output;
mod reconciler;
mod version;
#[cfg(test)]
mod test_utils;

use anyhow::{Context, Result};
use clap::Parser;
use cluster_client::KubeClusterClient;
use config::{Cli, Command};
use controller::Controller;
use std::process::ExitCode;
use tracing::{error, info};

/// Exit status for errors before any row is processed
const EXIT_STARTUP_ERROR: u8 = 1;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Keep the guard alive until exit so buffered file logs are flushed
    let _log_guard = match logging::init(cli.log_format, cli.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("cops: {e:#}");
            return ExitCode::from(EXIT_STARTUP_ERROR);
        }
    };

    match run(cli).await {
        Ok(status) => ExitCode::from(status),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(EXIT_STARTUP_ERROR)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    if cli.no_color {
        colored::control::set_override(false);
    }
    let color = !cli.no_color;

    match &cli.command {
        Command::Version => {
            println!("{}", version::render()?);
            Ok(controller::EXIT_OK)
        }
        Command::Validate { input: path } => {
            let rows = input::read_batch(path)?;
            println!("{}", output::render_validation(&rows, cli.output, color)?);

            let rejected = rows.iter().any(|row| row.is_err());
            Ok(if rejected && !cli.ignore_failures {
                controller::EXIT_ROW_FAILURES
            } else {
                controller::EXIT_OK
            })
        }
        Command::Alter { input: path } => {
            let config = cli.tuner_config()?;
            let rows = input::read_batch(path)?;

            // Configure rustls crypto provider (use ring)
            let _ = rustls::crypto::ring::default_provider().install_default();

            info!("Configuration:");
            info!("  Batch: {}", path.display());
            info!("  Context: {}", cli.context.as_deref().unwrap_or("current"));
            info!("  Label key: {}", config.label_key);
            info!("  Discovery concurrency: {}", config.discovery_concurrency);
            info!("  Verification: {:?}", config.verification);

            let client = KubeClusterClient::from_kubeconfig(cli.kubeconfig.as_deref(), cli.context.as_deref())
                .await
                .context("failed to create Kubernetes client")?;
            let controller = Controller::new(Box::new(client), config);

            let summary = controller.run(rows).await;
            println!("{}", output::render_summary(&summary, cli.output, color)?);
            Ok(summary.exit_status(cli.ignore_failures))
        }
    }
}
