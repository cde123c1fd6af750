use crate::cli::{Cli, Command};
use crate::error::Error;
use analytics::domain::DeviceCounts;
use analytics::{
    AnalyticsRequest, EnrollmentAnalytics, HistoryRepository, JsonFileRepository,
    MemoryRepository, Services, SystemClock,
};
use config::Config;
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Wire the analytics engine to the history location chosen on the command
/// line or in the configuration.
pub fn build_engine(cli: &Cli, config: Config) -> Result<EnrollmentAnalytics, Error> {
    // `config` never touches history
    let ephemeral = cli.in_memory || matches!(cli.command, Command::Config);
    let repo: Arc<dyn HistoryRepository> = if ephemeral {
        Arc::new(MemoryRepository::default())
    } else {
        let path = cli
            .history
            .clone()
            .or_else(|| config.history.resolve_path())
            .ok_or(Error::NoHistoryPath)?;
        debug!(path = %path.display(), "using history file");
        Arc::new(JsonFileRepository::new(path))
    };
    let services = Services::new(&config, repo, Arc::new(SystemClock));
    Ok(EnrollmentAnalytics::new(config, services))
}

/// Execute the selected command, writing its result to `out`.
pub async fn run(cli: &Cli, config: Config, mut out: impl Write) -> Result<(), Error> {
    let engine = build_engine(cli, config)?;
    if !matches!(cli.command, Command::Config) {
        let origin = engine.init().await;
        debug!(?origin, "history ready");
    }

    let result = execute(&engine, &cli.command, &mut out).await;
    engine.shutdown().await;
    result
}

async fn execute(
    engine: &EnrollmentAnalytics,
    command: &Command,
    out: &mut impl Write,
) -> Result<(), Error> {
    let store = engine.store();
    match command {
        Command::Record { counts, mock } => {
            let counts = checked(DeviceCounts::from(*counts))?;
            let outcome = store.record_snapshot(counts, !mock).await;
            info!(kind = ?outcome.kind, persisted = outcome.persisted, "snapshot recorded");
            write_json(out, &outcome)
        }
        Command::Analyze { request } => {
            let request = read_request(request)?;
            let result = engine.analyze(&request).await?;
            write_json(out, &result)
        }
        Command::Trend { counts } => {
            let counts = checked(DeviceCounts::from(*counts))?;
            let request = AnalyticsRequest {
                record: false,
                ..AnalyticsRequest::new(counts)
            };
            let result = engine.analyze(&request).await?;
            write_json(
                out,
                &TrendReport {
                    trend: &result.trend,
                    trend_data: &result.trend_data,
                },
            )
        }
        Command::Summary => write_json(out, &store.summary_stats().await),
        Command::Clear => {
            store.clear_history().await;
            write_json(out, &serde_json::json!({ "cleared": true }))
        }
        Command::Config => {
            let rendered = engine.config().to_toml()?;
            out.write_all(rendered.as_bytes()).map_err(Error::Output)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrendReport<'a> {
    trend: &'a analytics::trend::TrendAnalysis,
    trend_data: &'a analytics::store::TrendData,
}

fn checked(counts: DeviceCounts) -> Result<DeviceCounts, Error> {
    AnalyticsRequest::new(counts).validate()?;
    Ok(counts)
}

fn read_request(path: &Path) -> Result<AnalyticsRequest, Error> {
    let read_error = |source| Error::ReadRequest {
        path: path.to_path_buf(),
        source,
    };
    let mut raw = String::new();
    if path == Path::new("-") {
        io::stdin().read_to_string(&mut raw).map_err(read_error)?;
    } else {
        raw = std::fs::read_to_string(path).map_err(read_error)?;
    }
    serde_json::from_str(&raw).map_err(Error::ParseRequest)
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> Result<(), Error> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(|err| Error::Output(err.into()))?;
    writeln!(out).map_err(Error::Output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("enrollment-insights").chain(args.iter().copied()))
    }

    async fn run_to_json(cli: &Cli) -> serde_json::Value {
        let mut out = Vec::new();
        run(cli, Config::default(), &mut out).await.unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[tokio::test]
    async fn record_then_summarize_on_disk() {
        let dir = tempdir().unwrap();
        let history = dir.path().join("history.json");
        let history = history.to_str().unwrap();

        let recorded = run_to_json(&cli(&[
            "--history",
            history,
            "record",
            "--total",
            "1000",
            "--cloud-managed",
            "250",
        ]))
        .await;
        assert_eq!(recorded["kind"], "Appended");
        assert_eq!(recorded["persisted"], true);

        let summary = run_to_json(&cli(&["--history", history, "summary"])).await;
        assert_eq!(summary["currentDevices"], 1000);
        assert_eq!(summary["snapshotCount"], 1);

        let cleared = run_to_json(&cli(&["--history", history, "clear"])).await;
        assert_eq!(cleared["cleared"], true);
        assert!(!dir.path().join("history.json").exists());
    }

    #[tokio::test]
    async fn analyze_reads_request_file() {
        let dir = tempdir().unwrap();
        let request = dir.path().join("request.json");
        std::fs::write(
            &request,
            r#"{
                "counts": {"total": 400, "cloudManaged": 100, "configMgrOnly": 300, "cloudNative": 20},
                "signals": {"coManagementEnabled": true},
                "candidates": [
                    {"deviceId": "1", "deviceName": "PC-1", "readinessScore": 88.0}
                ]
            }"#,
        )
        .unwrap();

        let result = run_to_json(&cli(&[
            "--in-memory",
            "analyze",
            "--request",
            request.to_str().unwrap(),
        ]))
        .await;

        assert_eq!(result["record"]["kind"], "Appended");
        assert_eq!(result["trendData"]["quality"]["isProjected"], true);
        assert_eq!(result["lowRiskBatch"]["devices"][0]["deviceId"], "1");
        assert_eq!(result["milestones"].as_array().map(Vec::len), Some(7));
    }

    #[tokio::test]
    async fn inconsistent_counts_are_rejected() {
        let mut out = Vec::new();
        let err = run(
            &cli(&[
                "--in-memory",
                "record",
                "--total",
                "10",
                "--cloud-managed",
                "20",
            ]),
            Config::default(),
            &mut out,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Analytics(_)));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn config_renders_toml() {
        let mut out = Vec::new();
        run(&cli(&["config"]), Config::default(), &mut out)
            .await
            .unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("[history]"));
        assert!(rendered.contains("[stall]"));
        assert!(rendered.contains("retention_cap = 730"));
    }

    #[tokio::test]
    async fn config_leaves_history_untouched() {
        let dir = tempdir().unwrap();
        let history = dir.path().join("history.json");
        let mut out = Vec::new();
        run(
            &cli(&["--history", history.to_str().unwrap(), "config"]),
            Config::default(),
            &mut out,
        )
        .await
        .unwrap();
        assert!(!out.is_empty());
        assert!(!history.exists());
    }
}
