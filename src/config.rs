//! Configuration loading for the Logwarden daemon.
//!
//! Loads `logwarden.toml` with per-section defaults. All sections use
//! `#[serde(default)]` so a minimal or empty config file is valid. The
//! config is constructed once at startup and handed to the ingestion loop
//! by value — there is no process-wide configuration global.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Top-level Logwarden configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogwardenConfig {
    /// Persistent storage location.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Monitored log directory and filename convention.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Ingestion cycle timing.
    #[serde(default)]
    pub checks: ChecksConfig,

    /// Heuristic thresholds for issue detection.
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
}

/// Persistent storage location.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database. Defaults to `~/.logwarden/logwarden.db`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

/// Monitored log directory and filename convention.
///
/// Files matching `<file_prefix>*.log` are candidates; the lexicographically
/// greatest name is treated as the current file, so the suffix must sort by
/// recency (e.g. a `YYYYMMDD` date).
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Directory containing the application's log files.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Filename prefix of monitored files.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

/// Ingestion cycle timing.
#[derive(Debug, Clone, Deserialize)]
pub struct ChecksConfig {
    /// Seconds between ingestion cycles.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

/// Heuristic thresholds for issue detection.
///
/// All comparisons against these values are strict (`>`), so e.g. a 10.0%
/// error rate does not fire.
#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdsConfig {
    /// Per-component error rate (percent) above which an issue fires.
    #[serde(default = "default_error_rate_pct")]
    pub error_rate_pct: f64,

    /// Error rate (percent) above which the issue escalates to HIGH.
    #[serde(default = "default_error_rate_high_pct")]
    pub error_rate_high_pct: f64,

    /// Response time (ms) above which a request counts as slow.
    #[serde(default = "default_slow_response_ms")]
    pub slow_response_ms: i64,

    /// Database timeout count above which the issue escalates to CRITICAL.
    #[serde(default = "default_db_timeout_critical_count")]
    pub db_timeout_critical_count: u64,

    /// Authentication failure count that must be exceeded before firing.
    #[serde(default = "default_auth_failure_min_count")]
    pub auth_failure_min_count: u64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            error_rate_pct: default_error_rate_pct(),
            error_rate_high_pct: default_error_rate_high_pct(),
            slow_response_ms: default_slow_response_ms(),
            db_timeout_critical_count: default_db_timeout_critical_count(),
            auth_failure_min_count: default_auth_failure_min_count(),
        }
    }
}

/// Resolved filesystem paths for Logwarden's own state.
#[derive(Debug, Clone)]
pub struct LogwardenPaths {
    /// Root directory for Logwarden state (`~/.logwarden/`).
    pub root: PathBuf,

    /// Default path of the SQLite database.
    pub state_db: PathBuf,

    /// Directory for Logwarden's own rotated JSON logs.
    pub logs_dir: PathBuf,
}

impl LogwardenConfig {
    /// Validate that configuration values are within sane bounds.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value found.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.checks.interval_secs >= 1,
            "checks.interval_secs must be >= 1"
        );
        anyhow::ensure!(
            !self.monitor.file_prefix.is_empty(),
            "monitor.file_prefix must not be empty"
        );
        anyhow::ensure!(
            (0.0..=100.0).contains(&self.thresholds.error_rate_pct),
            "thresholds.error_rate_pct must be in [0.0, 100.0]"
        );
        anyhow::ensure!(
            (self.thresholds.error_rate_pct..=100.0).contains(&self.thresholds.error_rate_high_pct),
            "thresholds.error_rate_high_pct must be in [error_rate_pct, 100.0]"
        );
        anyhow::ensure!(
            self.thresholds.slow_response_ms > 0,
            "thresholds.slow_response_ms must be positive"
        );
        Ok(())
    }

    /// Resolve the database path, falling back to the default location.
    pub fn db_path(&self, paths: &LogwardenPaths) -> PathBuf {
        self.storage
            .db_path
            .clone()
            .unwrap_or_else(|| paths.state_db.clone())
    }
}

/// Load Logwarden configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or fails validation.
pub fn load_config(path: &Path) -> anyhow::Result<LogwardenConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config: LogwardenConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config at {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Resolve Logwarden's filesystem paths under `~/.logwarden/`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn logwarden_paths() -> anyhow::Result<LogwardenPaths> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    let root = home.home_dir().join(".logwarden");
    let state_db = root.join("logwarden.db");
    let logs_dir = root.join("logs");

    Ok(LogwardenPaths {
        root,
        state_db,
        logs_dir,
    })
}

// Default value functions for serde.

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_file_prefix() -> String {
    "app_".to_owned()
}

fn default_interval_secs() -> u64 {
    5
}

fn default_error_rate_pct() -> f64 {
    10.0
}

fn default_error_rate_high_pct() -> f64 {
    20.0
}

fn default_slow_response_ms() -> i64 {
    3000
}

fn default_db_timeout_critical_count() -> u64 {
    5
}

fn default_auth_failure_min_count() -> u64 {
    5
}
