//! Synthetic log line producer for local testing.
//!
//! Simulates a production application writing plausible log lines to a
//! date-suffixed file in the monitored directory. Purely an input source
//! for the ingestion pipeline — the daemon never depends on it.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, info};

/// Components the synthetic application logs under.
pub const COMPONENTS: [&str; 6] = ["Database", "API", "Auth", "Cache", "Queue", "Payment"];

/// Level probability weights: INFO is most common, ERROR is rare.
const LEVEL_WEIGHTS: [(&str, u32); 4] = [("INFO", 70), ("WARN", 20), ("ERROR", 8), ("DEBUG", 2)];

/// Build the output file path for a given date: `<prefix><YYYYMMDD>.log`.
///
/// The date suffix keeps filenames sortable so the tailer's
/// lexicographic-greatest discovery picks the newest file.
pub fn log_file_path(log_dir: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    log_dir.join(format!("{prefix}{}.log", date.format("%Y%m%d")))
}

/// Generate one log line in the `TIMESTAMP LEVEL [COMPONENT] MESSAGE` format.
///
/// The timestamp lands up to 60 seconds before `now`, mimicking an
/// application flushing slightly stale entries.
pub fn generate_line<R: Rng>(rng: &mut R, now: DateTime<Local>) -> String {
    let seconds_ago: i64 = rng.gen_range(0..=60);
    let timestamp = now
        .checked_sub_signed(chrono::Duration::seconds(seconds_ago))
        .unwrap_or(now);

    let level = LEVEL_WEIGHTS
        .choose_weighted(rng, |item| item.1)
        .map(|(level, _)| *level)
        .unwrap_or("INFO");

    let component = COMPONENTS.choose(rng).copied().unwrap_or("API");

    let message = render_message(rng, component, level);

    format!(
        "{} {level:<5} [{component}] {message}",
        timestamp.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Render a message for the given component and level.
///
/// Messages deliberately exercise every extraction path the parser has:
/// `...ms` durations, `user_id=` tokens, 3-digit status codes, "timeout"
/// wording on database errors, and "failed"/"invalid" wording on auth
/// errors.
fn render_message<R: Rng>(rng: &mut R, component: &str, level: &str) -> String {
    if level == "DEBUG" {
        return format!("{component} heartbeat ok, cycle {}", rng.gen_range(1..10_000));
    }

    match (component, level) {
        ("Database", "INFO") => match rng.gen_range(0..2) {
            0 => format!(
                "Query executed successfully in {}ms",
                rng.gen_range(50..500)
            ),
            _ => format!(
                "Connection pool: {} active connections",
                rng.gen_range(10..95)
            ),
        },
        ("Database", "WARN") => format!(
            "Slow query detected: {}ms for SELECT statement",
            rng.gen_range(1000..5000)
        ),
        ("Database", "ERROR") => match rng.gen_range(0..3) {
            0 => format!(
                "Query timeout after {}ms: SELECT * FROM users WHERE id = {}",
                rng.gen_range(3000..8000),
                rng.gen_range(1000..9999)
            ),
            1 => "Connection failed: Unable to reach database server".to_owned(),
            _ => "Deadlock detected on table users".to_owned(),
        },
        ("API", "INFO") => match rng.gen_range(0..2) {
            0 => format!(
                "GET /api/users/{} completed in {}ms",
                rng.gen_range(1..1000),
                rng.gen_range(50..800)
            ),
            _ => format!("Request processed: user_id={}", rng.gen_range(1000..9999)),
        },
        ("API", "WARN") => format!(
            "Slow response: /api/orders took {}ms",
            rng.gen_range(2000..5000)
        ),
        ("API", "ERROR") => match rng.gen_range(0..3) {
            0 => "500 Internal Server Error: /api/orders".to_owned(),
            1 => "404 Not Found: /api/products".to_owned(),
            _ => format!(
                "Authentication failed for user_id={}",
                rng.gen_range(1000..9999)
            ),
        },
        ("Auth", "INFO") => format!("User login successful: user_id={}", rng.gen_range(1000..9999)),
        ("Auth", "WARN") => format!(
            "Failed login attempt for user_id={}",
            rng.gen_range(1000..9999)
        ),
        ("Auth", "ERROR") => match rng.gen_range(0..2) {
            0 => format!(
                "Invalid credentials for user_id={}",
                rng.gen_range(1000..9999)
            ),
            _ => format!(
                "Brute force attack detected from IP 192.168.{}.{}",
                rng.gen_range(1..255),
                rng.gen_range(1..255)
            ),
        },
        ("Cache", "INFO") => format!("Cache hit: key=cache_key_{}", rng.gen_range(1..100)),
        ("Cache", "WARN") => format!("Cache miss rate high: {}%", rng.gen_range(40..80)),
        ("Cache", "ERROR") => "Cache server unreachable".to_owned(),
        ("Queue", "INFO") => format!(
            "Message processed: queue=orders time={}ms",
            rng.gen_range(10..400)
        ),
        ("Queue", "WARN") => format!(
            "Queue backlog growing: {} messages",
            rng.gen_range(100..5000)
        ),
        ("Queue", "ERROR") => format!("Worker crashed: worker_id={}", rng.gen_range(1..10)),
        ("Payment", "INFO") => format!(
            "Payment processed: amount=${}.{:02} user_id={}",
            rng.gen_range(10..500),
            rng.gen_range(0..99),
            rng.gen_range(1000..9999)
        ),
        ("Payment", "WARN") => format!(
            "Payment gateway latency high: {}ms",
            rng.gen_range(2000..6000)
        ),
        ("Payment", "ERROR") => "Payment gateway timeout".to_owned(),
        _ => format!("{component} event at level {level}"),
    }
}

/// Continuously append synthetic lines to the dated log file.
///
/// One line per tick of `interval_ms`, flushed after each write. Stops
/// after `count` lines when given, or when shutdown is signalled.
///
/// # Errors
///
/// Returns an error if the log directory or file cannot be written.
pub async fn run(
    log_dir: &Path,
    prefix: &str,
    interval_ms: u64,
    count: Option<u64>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let path = log_file_path(log_dir, prefix, Local::now().date_naive());
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    info!(file = %path.display(), "generating synthetic log lines");

    let mut rng = rand::thread_rng();
    let mut written: u64 = 0;
    let mut interval = tokio::time::interval(tokio::time::Duration::from_millis(interval_ms));

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => {}
        }

        if *shutdown.borrow() {
            info!(written, "generator stopped");
            return Ok(());
        }

        let line = generate_line(&mut rng, Local::now());
        writeln!(file, "{line}")
            .with_context(|| format!("failed to write to {}", path.display()))?;
        file.flush()
            .with_context(|| format!("failed to flush {}", path.display()))?;

        written = written.saturating_add(1);
        debug!(line = %line, "wrote synthetic line");

        if count.is_some_and(|target| written >= target) {
            info!(written, "generator finished");
            return Ok(());
        }
    }
}
