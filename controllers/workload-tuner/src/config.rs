//! Command line and runtime configuration.

use crate::error::ReconcileError;
use crate::logging::LogFormat;
use crate::output::OutputFormat;
use crate::reconciler::verifier::VerificationMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default tracking label key
pub const DEFAULT_LABEL_KEY: &str = "app";

/// Default cap on concurrent pod scans
pub const DEFAULT_DISCOVERY_CONCURRENCY: usize = 64;

/// Bulk-tune replicas and container resources of Deployments and StatefulSets
#[derive(Debug, Parser)]
#[command(name = "cops")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to kubeconfig file (uses the default discovery chain if not specified)
    #[arg(long, global = true, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// kubeconfig context to use
    #[arg(long, global = true, env = "COPS_CONTEXT")]
    pub context: Option<String>,

    /// Pod label whose value must equal the workload name
    #[arg(long, global = true, env = "COPS_LABEL_KEY", default_value = DEFAULT_LABEL_KEY)]
    pub label_key: String,

    /// Maximum number of pods scanned concurrently during discovery
    #[arg(long, global = true, env = "COPS_DISCOVERY_CONCURRENCY", default_value_t = DEFAULT_DISCOVERY_CONCURRENCY)]
    pub discovery_concurrency: usize,

    /// How written-back quantities are compared with the requested ones
    #[arg(long, global = true, env = "COPS_VERIFICATION", value_enum, default_value_t = VerificationMode::Literal)]
    pub verification: VerificationMode,

    /// Output format
    #[arg(long, short, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Exit 0 even when rows were rejected, unresolved or failed
    #[arg(long, global = true)]
    pub ignore_failures: bool,

    /// Log format on stderr (and in the log file)
    #[arg(long, global = true, env = "COPS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Also write logs to a daily-rotated cops-run.log in this directory
    #[arg(long, global = true, env = "COPS_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply a batch file to the cluster
    Alter {
        /// CSV batch file (header line plus one row per workload)
        input: PathBuf,
    },

    /// Parse and validate a batch file without contacting the cluster
    Validate {
        /// CSV batch file (header line plus one row per workload)
        input: PathBuf,
    },

    /// Print the version and the MD5 hash of this executable
    Version,
}

/// Settings the reconciliation engine needs
#[derive(Debug, Clone)]
pub struct TunerConfig {
    pub label_key: String,
    pub discovery_concurrency: usize,
    pub verification: VerificationMode,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            label_key: DEFAULT_LABEL_KEY.to_string(),
            discovery_concurrency: DEFAULT_DISCOVERY_CONCURRENCY,
            verification: VerificationMode::Literal,
        }
    }
}

impl Cli {
    /// Engine settings, validated
    pub fn tuner_config(&self) -> Result<TunerConfig, ReconcileError> {
        if self.discovery_concurrency == 0 {
            return Err(ReconcileError::InvalidConfig(
                "--discovery-concurrency must be at least 1".to_string(),
            ));
        }
        let label_key = self.label_key.trim();
        if label_key.is_empty() {
            return Err(ReconcileError::InvalidConfig(
                "--label-key must not be empty".to_string(),
            ));
        }
        Ok(TunerConfig {
            label_key: label_key.to_string(),
            discovery_concurrency: self.discovery_concurrency,
            verification: self.verification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["cops", "alter", "batch.csv"]).unwrap();
        let config = cli.tuner_config().unwrap();

        assert_eq!(config.label_key, "app");
        assert_eq!(config.discovery_concurrency, 64);
        assert_eq!(config.verification, VerificationMode::Literal);
        assert!(matches!(cli.command, Command::Alter { ref input } if input == &PathBuf::from("batch.csv")));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cops",
            "validate",
            "batch.csv",
            "--verification",
            "semantic",
            "--output",
            "json",
            "--label-key",
            "app.kubernetes.io/name",
        ])
        .unwrap();

        assert!(matches!(cli.command, Command::Validate { .. }));
        assert_eq!(cli.output, OutputFormat::Json);
        let config = cli.tuner_config().unwrap();
        assert_eq!(config.verification, VerificationMode::Semantic);
        assert_eq!(config.label_key, "app.kubernetes.io/name");
    }

    #[test]
    fn test_version_subcommand() {
        let cli = Cli::try_parse_from(["cops", "version"]).unwrap();
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn test_zero_concurrency_is_invalid() {
        let cli = Cli::try_parse_from(["cops", "alter", "batch.csv", "--discovery-concurrency", "0"]).unwrap();
        assert!(matches!(cli.tuner_config(), Err(ReconcileError::InvalidConfig(_))));
    }
}
