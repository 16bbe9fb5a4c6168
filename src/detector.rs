//! Batch heuristics producing issue observations.
//!
//! Four rule-based heuristics evaluate one batch of parsed records and
//! produce at most one observation each (one per component for the error
//! rate rule). The detector is stateless across batches — cumulative
//! tracking is the store's job.

use serde::{Deserialize, Serialize};

use crate::config::ThresholdsConfig;
use crate::parser::LogRecord;

/// Severity level for a detected issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// May need attention soon.
    Medium,
    /// Needs attention now.
    High,
    /// Service health is at risk.
    Critical,
}

impl Severity {
    /// Stable string form used in persistence and log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Kind of operational issue a heuristic can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    /// A component's error rate exceeded the threshold.
    HighErrorRate,
    /// Database queries timing out.
    DatabaseTimeout,
    /// Requests taking too long to complete.
    SlowResponseTime,
    /// Repeated failed authentication attempts.
    AuthenticationFailures,
}

impl IssueType {
    /// Stable string form used as part of the dedup key in the store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HighErrorRate => "high_error_rate",
            Self::DatabaseTimeout => "database_timeout",
            Self::SlowResponseTime => "slow_response_time",
            Self::AuthenticationFailures => "authentication_failures",
        }
    }
}

/// One heuristic firing over one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueObservation {
    /// Which heuristic fired.
    pub issue_type: IssueType,
    /// How severe this observation is.
    pub severity: Severity,
    /// Component the observation is scoped to.
    pub component: String,
    /// Human-readable, batch-scoped description.
    pub description: String,
    /// Occurrences counted within this batch only.
    pub occurrence_count: i64,
}

/// Evaluate all heuristics over one batch of records.
///
/// Observations are emitted in a fixed order: per-component error rate
/// findings first (components in first-seen order within the batch), then
/// database timeouts, slow responses, and authentication failures.
pub fn detect(batch: &[LogRecord], thresholds: &ThresholdsConfig) -> Vec<IssueObservation> {
    let mut observations = Vec::new();

    // Group records by component, preserving first-seen order so output is
    // deterministic for a given batch.
    let mut buckets: Vec<(&str, Vec<&LogRecord>)> = Vec::new();
    for record in batch {
        match buckets
            .iter_mut()
            .find(|(component, _)| *component == record.component.as_str())
        {
            Some((_, records)) => records.push(record),
            None => buckets.push((record.component.as_str(), vec![record])),
        }
    }

    // Heuristic 1: high error rate per component.
    for (component, records) in &buckets {
        let total = records.len();
        let errors = records.iter().filter(|r| r.level == "ERROR").count();

        #[allow(clippy::cast_precision_loss)]
        let error_rate = errors as f64 / total as f64 * 100.0;

        if error_rate > thresholds.error_rate_pct {
            let severity = if error_rate > thresholds.error_rate_high_pct {
                Severity::High
            } else {
                Severity::Medium
            };

            observations.push(IssueObservation {
                issue_type: IssueType::HighErrorRate,
                severity,
                component: (*component).to_owned(),
                description: format!(
                    "{component} has {error_rate:.1}% error rate ({errors}/{total} entries)"
                ),
                occurrence_count: count_to_i64(errors),
            });
        }
    }

    // Heuristic 2: database timeouts among ERROR records.
    let db_timeouts = batch
        .iter()
        .filter(|r| {
            r.level == "ERROR"
                && r.component == "Database"
                && r.message.to_lowercase().contains("timeout")
        })
        .count();

    if db_timeouts > 0 {
        let severity = if count_to_u64(db_timeouts) > thresholds.db_timeout_critical_count {
            Severity::Critical
        } else {
            Severity::High
        };

        observations.push(IssueObservation {
            issue_type: IssueType::DatabaseTimeout,
            severity,
            component: "Database".to_owned(),
            description: format!("Database timeouts detected: {db_timeouts} occurrences"),
            occurrence_count: count_to_i64(db_timeouts),
        });
    }

    // Heuristic 3: slow responses, any level. Component is fixed to "API"
    // regardless of where the slow record came from.
    let slow: Vec<i64> = batch
        .iter()
        .filter_map(|r| r.response_time_ms)
        .filter(|ms| *ms > thresholds.slow_response_ms)
        .collect();

    if !slow.is_empty() {
        let sum: i64 = slow.iter().fold(0, |acc, ms| acc.saturating_add(*ms));
        let count = slow.len();

        #[allow(clippy::cast_precision_loss)]
        let avg_ms = sum as f64 / count as f64;

        observations.push(IssueObservation {
            issue_type: IssueType::SlowResponseTime,
            severity: Severity::Medium,
            component: "API".to_owned(),
            description: format!(
                "Slow responses detected: {count} requests averaging {avg_ms:.0}ms"
            ),
            occurrence_count: count_to_i64(count),
        });
    }

    // Heuristic 4: authentication failures. Unlike the others this fires
    // only when the count strictly exceeds the threshold.
    let auth_failures = batch
        .iter()
        .filter(|r| {
            if r.level != "ERROR" || r.component != "Auth" {
                return false;
            }
            let message = r.message.to_lowercase();
            message.contains("failed") || message.contains("invalid")
        })
        .count();

    if count_to_u64(auth_failures) > thresholds.auth_failure_min_count {
        observations.push(IssueObservation {
            issue_type: IssueType::AuthenticationFailures,
            severity: Severity::High,
            component: "Auth".to_owned(),
            description: format!(
                "Multiple failed authentication attempts: {auth_failures} occurrences"
            ),
            occurrence_count: count_to_i64(auth_failures),
        });
    }

    observations
}

/// Convert a batch count to the i64 used in observations and the store.
fn count_to_i64(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// Convert a batch count to u64 for threshold comparison.
fn count_to_u64(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}
