//! Logwarden CLI entry point.
//!
//! Provides `start`, `check`, `status`, `issues`, `resolve`, and `generate`
//! subcommands for running the ingestion daemon, one-shot inspection, issue
//! management, and synthetic log production.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};

use logwarden::config::{load_config, logwarden_paths, LogwardenConfig};
use logwarden::pipeline::IngestionLoop;
use logwarden::store::IssueStore;
use logwarden::tailer::Tailer;
use logwarden::{detector, generator, logging, parser};

/// Logwarden — log file ingestion and operational issue detection.
#[derive(Parser)]
#[command(name = "logwarden", version, about)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "logwarden.toml")]
    config: PathBuf,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run the ingestion daemon.
    Start,
    /// Read the current log file from the start, report detected issues, exit.
    Check,
    /// Show store counters (persisted entries, open issues).
    Status,
    /// List unresolved issues.
    Issues {
        /// Emit machine-readable JSON on stdout instead of log lines.
        #[arg(long)]
        json: bool,
    },
    /// Mark an issue as resolved.
    Resolve {
        /// ID of the issue to resolve.
        id: i64,
    },
    /// Write synthetic log lines into the monitored directory.
    Generate {
        /// Stop after this many lines (default: run until interrupted).
        #[arg(long)]
        count: Option<u64>,

        /// Milliseconds between lines.
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Start => handle_start(&cli.config).await,
        Command::Check => handle_check(&cli.config).await,
        Command::Status => handle_status(&cli.config).await,
        Command::Issues { json } => handle_issues(&cli.config, json).await,
        Command::Resolve { id } => handle_resolve(&cli.config, id).await,
        Command::Generate { count, interval_ms } => {
            handle_generate(&cli.config, count, interval_ms).await
        }
    }
}

/// Load config and open the store, failing fast on either.
///
/// Malformed configuration or an unreachable store at startup is fatal;
/// the ingestion loop must never run without a working store.
async fn load_config_and_store(
    config_path: &PathBuf,
) -> anyhow::Result<(LogwardenConfig, Arc<IssueStore>)> {
    let paths = logwarden_paths()?;

    let config = load_config(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let db_path = config.db_path(&paths);
    let store = Arc::new(IssueStore::open(&db_path).await?);

    Ok((config, store))
}

/// Install a ctrl-c handler that flips a watch channel.
fn shutdown_channel() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(true);
        }
    });
    rx
}

/// Run the ingestion daemon.
async fn handle_start(config_path: &PathBuf) -> anyhow::Result<()> {
    let paths = logwarden_paths()?;

    std::fs::create_dir_all(&paths.root)
        .with_context(|| format!("failed to create {}", paths.root.display()))?;

    let _logging_guard = logging::init_production(&paths.logs_dir)?;

    let (config, store) = load_config_and_store(config_path).await?;

    info!(
        config = %config_path.display(),
        log_dir = %config.monitor.log_dir.display(),
        prefix = %config.monitor.file_prefix,
        interval_secs = config.checks.interval_secs,
        "logwarden daemon started"
    );

    let shutdown = shutdown_channel();
    let mut ingestion = IngestionLoop::new(config, store);
    ingestion.run(shutdown).await
}

/// Read the current log file from offset 0 and report what would fire.
///
/// Detection only — nothing is persisted, so repeated checks are harmless.
async fn handle_check(config_path: &PathBuf) -> anyhow::Result<()> {
    logging::init_cli();

    let config = load_config(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let tailer = Tailer::new(
        config.monitor.log_dir.clone(),
        config.monitor.file_prefix.clone(),
    );

    let path = match tailer.discover_latest()? {
        Some(path) => path,
        None => {
            info!(
                log_dir = %config.monitor.log_dir.display(),
                prefix = %config.monitor.file_prefix,
                "no log file found"
            );
            return Ok(());
        }
    };

    let (lines, _) = Tailer::read_from(&path, 0)?;
    let records: Vec<_> = lines
        .iter()
        .filter_map(|line| parser::parse_line(line).ok())
        .collect();

    info!(
        file = %path.display(),
        lines = lines.len(),
        parsed = records.len(),
        "scanned current log file"
    );

    let observations = detector::detect(&records, &config.thresholds);

    if observations.is_empty() {
        info!("no issues detected");
    } else {
        for observation in &observations {
            info!(
                issue_type = observation.issue_type.as_str(),
                severity = observation.severity.as_str(),
                component = %observation.component,
                count = observation.occurrence_count,
                description = %observation.description,
                "issue detected"
            );
        }
    }

    Ok(())
}

/// Show store counters.
async fn handle_status(config_path: &PathBuf) -> anyhow::Result<()> {
    logging::init_cli();

    let (_, store) = load_config_and_store(config_path).await?;

    info!(
        log_entries = store.log_entry_count().await?,
        open_issues = store.open_issue_count().await?,
        "store status"
    );

    Ok(())
}

/// List unresolved issues.
async fn handle_issues(config_path: &PathBuf, json: bool) -> anyhow::Result<()> {
    logging::init_cli();

    let (_, store) = load_config_and_store(config_path).await?;
    let issues = store.open_issues().await?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&issues).context("failed to serialize issues")?;
        println!("{rendered}");
        return Ok(());
    }

    if issues.is_empty() {
        info!("no open issues");
    } else {
        for issue in &issues {
            info!(
                issue_id = issue.id,
                issue_type = %issue.issue_type,
                severity = %issue.severity,
                component = %issue.component,
                occurrences = issue.occurrence_count,
                first_seen = %issue.first_seen,
                last_seen = %issue.last_seen,
                "open issue"
            );
        }
    }

    Ok(())
}

/// Mark an issue as resolved.
async fn handle_resolve(config_path: &PathBuf, id: i64) -> anyhow::Result<()> {
    logging::init_cli();

    let (_, store) = load_config_and_store(config_path).await?;

    if store.mark_resolved(id).await? {
        info!(issue_id = id, "issue resolved");
    } else {
        warn!(issue_id = id, "no issue with that id");
    }

    Ok(())
}

/// Write synthetic log lines into the monitored directory.
async fn handle_generate(
    config_path: &PathBuf,
    count: Option<u64>,
    interval_ms: u64,
) -> anyhow::Result<()> {
    logging::init_cli();

    let config = load_config(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let shutdown = shutdown_channel();
    generator::run(
        &config.monitor.log_dir,
        &config.monitor.file_prefix,
        interval_ms,
        count,
        shutdown,
    )
    .await
}
