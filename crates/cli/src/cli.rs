use analytics::domain::DeviceCounts;
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::{Path, PathBuf};

/// Enrollment insights: cloud enrollment analytics for co-managed fleets
///
/// Records device-count snapshots, derives enrollment trends, scores the
/// likelihood that migration keeps progressing, flags stalls and recommends
/// the next playbook. Results are written to stdout as JSON.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short, long, value_parser = validate_file)]
    pub conffile: Option<PathBuf>,

    /// History file to load and save snapshots to.
    ///
    /// Defaults to `history.path` from the configuration, then to the
    /// per-user data directory.
    #[arg(short = 'H', long)]
    pub history: Option<PathBuf>,

    /// Keep history in memory only. Nothing is read from or written to disk.
    #[arg(long, conflicts_with = "history")]
    pub in_memory: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Record a snapshot of the current device counts.
    Record {
        #[command(flatten)]
        counts: CountsArgs,

        /// The counts are sample data rather than a live query.
        #[arg(long)]
        mock: bool,
    },
    /// Run the full analysis for a JSON request.
    Analyze {
        /// Request file. `-` reads from stdin.
        #[arg(short, long)]
        request: PathBuf,
    },
    /// Print chart points and the trend classification.
    Trend {
        #[command(flatten)]
        counts: CountsArgs,
    },
    /// Print summary statistics of the recorded history.
    Summary,
    /// Delete the recorded history.
    Clear,
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Debug, Args, Clone, Copy)]
pub struct CountsArgs {
    /// Total managed devices.
    #[arg(long)]
    pub total: u64,

    /// Devices enrolled in cloud management.
    #[arg(long)]
    pub cloud_managed: u64,

    /// Devices managed by Configuration Manager only. Defaults to the
    /// devices not yet cloud-managed.
    #[arg(long)]
    pub config_mgr_only: Option<u64>,

    /// Cloud-native devices.
    #[arg(long, default_value_t = 0)]
    pub cloud_native: u64,
}

impl From<CountsArgs> for DeviceCounts {
    fn from(args: CountsArgs) -> Self {
        DeviceCounts::new(
            args.total,
            args.cloud_managed,
            args.config_mgr_only
                .unwrap_or_else(|| args.total.saturating_sub(args.cloud_managed)),
            args.cloud_native,
        )
    }
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_mgr_only_defaults_to_gap() {
        let cli = Cli::parse_from([
            "enrollment-insights",
            "--in-memory",
            "record",
            "--total",
            "1000",
            "--cloud-managed",
            "200",
        ]);
        let Command::Record { counts, mock } = cli.command else {
            panic!("expected record");
        };
        assert!(!mock);
        assert_eq!(
            DeviceCounts::from(counts),
            DeviceCounts::new(1000, 200, 800, 0)
        );
    }

    #[test]
    fn history_and_in_memory_conflict() {
        let parsed = Cli::try_parse_from([
            "enrollment-insights",
            "--in-memory",
            "--history",
            "h.json",
            "summary",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_conffile_is_rejected() {
        let parsed = Cli::try_parse_from([
            "enrollment-insights",
            "--conffile",
            "/definitely/not/here.toml",
            "config",
        ]);
        assert!(parsed.is_err());
    }
}
