//! Tests for the batch issue heuristics.

use logwarden::config::ThresholdsConfig;
use logwarden::detector::{detect, IssueType, Severity};
use logwarden::parser::LogRecord;

fn record(level: &str, component: &str, message: &str) -> LogRecord {
    LogRecord {
        timestamp: "2026-08-29 10:00:00".to_owned(),
        level: level.to_owned(),
        component: component.to_owned(),
        message: message.to_owned(),
        response_time_ms: None,
        user_id: None,
        error_code: None,
    }
}

fn timed_record(level: &str, component: &str, response_time_ms: i64) -> LogRecord {
    LogRecord {
        response_time_ms: Some(response_time_ms),
        ..record(level, component, "request completed")
    }
}

fn batch_with_errors(component: &str, errors: usize, total: usize) -> Vec<LogRecord> {
    let mut batch = Vec::new();
    for _ in 0..errors {
        batch.push(record("ERROR", component, "request handling error"));
    }
    for _ in errors..total {
        batch.push(record("INFO", component, "request handled"));
    }
    batch
}

#[test]
fn error_rate_at_threshold_does_not_fire() {
    let batch = batch_with_errors("X", 10, 100);
    let observations = detect(&batch, &ThresholdsConfig::default());

    assert!(observations.is_empty());
}

#[test]
fn error_rate_above_threshold_fires_medium() {
    let batch = batch_with_errors("X", 11, 100);
    let observations = detect(&batch, &ThresholdsConfig::default());

    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].issue_type, IssueType::HighErrorRate);
    assert_eq!(observations[0].severity, Severity::Medium);
    assert_eq!(observations[0].component, "X");
    assert_eq!(observations[0].occurrence_count, 11);
    assert!(observations[0].description.contains("11.0%"));
    assert!(observations[0].description.contains("11/100"));
}

#[test]
fn error_rate_above_high_threshold_fires_high() {
    let batch = batch_with_errors("X", 21, 100);
    let observations = detect(&batch, &ThresholdsConfig::default());

    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].severity, Severity::High);
    assert_eq!(observations[0].occurrence_count, 21);
}

#[test]
fn error_rate_is_per_component() {
    let mut batch = batch_with_errors("Api", 5, 10);
    batch.extend(batch_with_errors("Clean", 0, 50));
    let observations = detect(&batch, &ThresholdsConfig::default());

    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].component, "Api");
}

#[test]
fn database_timeout_fires_on_single_occurrence() {
    // Keep the Database error rate at exactly 10% so only the timeout rule fires.
    let mut batch = batch_with_errors("Database", 0, 9);
    batch.push(record(
        "ERROR",
        "Database",
        "Query TIMEOUT after long wait",
    ));
    let observations = detect(&batch, &ThresholdsConfig::default());

    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].issue_type, IssueType::DatabaseTimeout);
    assert_eq!(observations[0].severity, Severity::High);
    assert_eq!(observations[0].component, "Database");
    assert_eq!(observations[0].occurrence_count, 1);
}

#[test]
fn database_timeout_escalates_to_critical_above_five() {
    let mut batch = batch_with_errors("Database", 0, 54);
    for _ in 0..6 {
        batch.push(record("ERROR", "Database", "Query timeout after 5000ms"));
    }
    let observations = detect(&batch, &ThresholdsConfig::default());

    let timeout = observations
        .iter()
        .find(|o| o.issue_type == IssueType::DatabaseTimeout)
        .expect("timeout observation");
    assert_eq!(timeout.severity, Severity::Critical);
    assert_eq!(timeout.occurrence_count, 6);
}

#[test]
fn database_timeout_requires_error_level() {
    let mut batch = batch_with_errors("Database", 0, 9);
    batch.push(record("WARN", "Database", "Slow query near timeout"));
    let observations = detect(&batch, &ThresholdsConfig::default());

    assert!(observations.is_empty());
}

#[test]
fn slow_response_at_threshold_does_not_fire() {
    let batch = vec![timed_record("INFO", "API", 3000)];
    let observations = detect(&batch, &ThresholdsConfig::default());

    assert!(observations.is_empty());
}

#[test]
fn slow_response_fires_medium_with_mean() {
    let batch = vec![
        timed_record("INFO", "API", 4000),
        timed_record("WARN", "Payment", 5000),
        timed_record("INFO", "API", 800),
    ];
    let observations = detect(&batch, &ThresholdsConfig::default());

    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].issue_type, IssueType::SlowResponseTime);
    assert_eq!(observations[0].severity, Severity::Medium);
    // Component is fixed to "API" regardless of where slow records came from.
    assert_eq!(observations[0].component, "API");
    assert_eq!(observations[0].occurrence_count, 2);
    assert!(observations[0].description.contains("averaging 4500ms"));
}

#[test]
fn auth_failures_at_threshold_do_not_fire() {
    // 5 auth errors in 50 records: 10% rate, under both rules' thresholds.
    let mut batch = batch_with_errors("Auth", 0, 45);
    for _ in 0..5 {
        batch.push(record("ERROR", "Auth", "Invalid credentials for user"));
    }
    let observations = detect(&batch, &ThresholdsConfig::default());

    assert!(observations.is_empty());
}

#[test]
fn auth_failures_above_threshold_fire_high() {
    let mut batch = batch_with_errors("Auth", 0, 54);
    for _ in 0..6 {
        batch.push(record("ERROR", "Auth", "Login FAILED for user"));
    }
    let observations = detect(&batch, &ThresholdsConfig::default());

    assert_eq!(observations.len(), 1);
    assert_eq!(
        observations[0].issue_type,
        IssueType::AuthenticationFailures
    );
    assert_eq!(observations[0].severity, Severity::High);
    assert_eq!(observations[0].occurrence_count, 6);
}

#[test]
fn auth_failures_require_error_level() {
    let mut batch = batch_with_errors("Auth", 0, 54);
    for _ in 0..6 {
        batch.push(record("WARN", "Auth", "Failed login attempt"));
    }
    let observations = detect(&batch, &ThresholdsConfig::default());

    assert!(observations.is_empty());
}

#[test]
fn observations_emitted_in_fixed_order() {
    // Component "Web" trips the error-rate rule; Database trips the timeout
    // rule while staying at a 10% error rate.
    let mut batch = batch_with_errors("Web", 3, 10);
    batch.extend(batch_with_errors("Database", 0, 9));
    batch.push(record("ERROR", "Database", "Query timeout after 4000ms"));
    let observations = detect(&batch, &ThresholdsConfig::default());

    assert_eq!(observations.len(), 2);
    assert_eq!(observations[0].issue_type, IssueType::HighErrorRate);
    assert_eq!(observations[0].component, "Web");
    assert_eq!(observations[1].issue_type, IssueType::DatabaseTimeout);
}

#[test]
fn empty_batch_yields_no_observations() {
    let observations = detect(&[], &ThresholdsConfig::default());
    assert!(observations.is_empty());
}
