//! Log line parsing into structured records.
//!
//! One raw text line maps to either a [`LogRecord`] or a [`ParseError`] —
//! never a partial record. Callers drop failures silently; a malformed line
//! contributes nothing downstream.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Structural grammar: `YYYY-MM-DD HH:MM:SS LEVEL [COMPONENT] MESSAGE`.
static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\s+(?P<level>\w+)\s+\[(?P<component>[^\]]+)\]\s+(?P<message>.*)$",
    )
    .expect("line grammar regex is valid")
});

/// First integer immediately followed by the literal `ms`.
static RESPONSE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)ms").expect("response time regex is valid"));

/// First integer following a `user_id=` or `user_id:` token.
static USER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"user_id[=:](\d+)").expect("user id regex is valid"));

/// First run of 3 consecutive digits anywhere in the message. Deliberately
/// over-matches incidental numbers (e.g. the "523" in "5231ms").
static ERROR_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{3}").expect("error code regex is valid"));

/// A structured record parsed from one log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Wall-clock timestamp as written in the line (seconds precision).
    pub timestamp: String,

    /// Log level token. Open set — unrecognized values pass through as-is.
    pub level: String,

    /// Component label taken from inside the bracket pair.
    pub component: String,

    /// Free-text remainder of the line.
    pub message: String,

    /// Response time in milliseconds, if the message contains one.
    pub response_time_ms: Option<i64>,

    /// User identifier, if the message contains a `user_id=`/`user_id:` token.
    pub user_id: Option<i64>,

    /// First 3-digit run found in the message, if any.
    pub error_code: Option<String>,
}

/// Error returned when a line does not match the structural grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("line does not match the `TIMESTAMP LEVEL [COMPONENT] MESSAGE` grammar")]
pub struct ParseError;

/// Parse a single raw log line into a [`LogRecord`].
///
/// The line must match the structural grammar after trimming surrounding
/// whitespace. The three secondary extractions from the message are
/// independent of each other, each optional, first match wins.
///
/// Pure and deterministic; safe to call from multiple threads.
///
/// # Errors
///
/// Returns [`ParseError`] when the line does not match the grammar.
pub fn parse_line(line: &str) -> Result<LogRecord, ParseError> {
    let caps = LINE_RE.captures(line.trim()).ok_or(ParseError)?;

    let message = caps["message"].to_owned();

    let response_time_ms = RESPONSE_TIME_RE
        .captures(&message)
        .and_then(|c| c[1].parse::<i64>().ok());

    let user_id = USER_ID_RE
        .captures(&message)
        .and_then(|c| c[1].parse::<i64>().ok());

    let error_code = ERROR_CODE_RE
        .find(&message)
        .map(|m| m.as_str().to_owned());

    Ok(LogRecord {
        timestamp: caps["timestamp"].to_owned(),
        level: caps["level"].to_owned(),
        component: caps["component"].to_owned(),
        message,
        response_time_ms,
        user_id,
        error_code,
    })
}
