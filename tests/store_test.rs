//! Tests for the SQLite-backed issue store.

use logwarden::detector::{IssueObservation, IssueType, Severity};
use logwarden::parser::LogRecord;
use logwarden::store::{IssueStore, ReconcileOutcome};

async fn open_temp_db() -> (tempfile::TempDir, IssueStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = IssueStore::open(&dir.path().join("logwarden.db"))
        .await
        .expect("open store");
    (dir, store)
}

fn observation(
    issue_type: IssueType,
    severity: Severity,
    component: &str,
    description: &str,
    occurrence_count: i64,
) -> IssueObservation {
    IssueObservation {
        issue_type,
        severity,
        component: component.to_owned(),
        description: description.to_owned(),
        occurrence_count,
    }
}

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

#[tokio::test]
async fn open_creates_empty_tables() {
    let (_dir, store) = open_temp_db().await;

    assert_eq!(store.log_entry_count().await.expect("count"), 0);
    assert_eq!(store.open_issue_count().await.expect("count"), 0);
}

#[tokio::test]
async fn insert_records_roundtrip() {
    let (_dir, store) = open_temp_db().await;

    let records = vec![
        LogRecord {
            response_time_ms: Some(234),
            user_id: Some(4521),
            error_code: Some("452".to_owned()),
            ..record("INFO", "API", "Request for user_id=4521 completed in 234ms")
        },
        record("ERROR", "Cache", "Cache server unreachable"),
    ];
    store.insert_records(&records).await.expect("insert");

    assert_eq!(store.log_entry_count().await.expect("count"), 2);

    let recent = store.recent_entries(10).await.expect("recent");
    assert_eq!(recent.len(), 2);
    // Most recent first.
    assert_eq!(recent[0], records[1]);
    assert_eq!(recent[1], records[0]);
}

#[tokio::test]
async fn insert_empty_batch_is_a_noop() {
    let (_dir, store) = open_temp_db().await;

    store.insert_records(&[]).await.expect("insert");
    assert_eq!(store.log_entry_count().await.expect("count"), 0);
}

#[tokio::test]
async fn reconcile_creates_then_merges() {
    let (_dir, store) = open_temp_db().await;

    let first = observation(
        IssueType::DatabaseTimeout,
        Severity::High,
        "Database",
        "3 database timeouts detected",
        3,
    );
    let outcome = store.reconcile(&first).await.expect("reconcile");
    let id = match outcome {
        ReconcileOutcome::Created(id) => id,
        ReconcileOutcome::Merged(_) => panic!("expected a new issue"),
    };

    let created = store.open_issues().await.expect("issues");
    let first_seen = created[0].first_seen.clone();
    let created_last_seen = created[0].last_seen.clone();

    let second = observation(
        IssueType::DatabaseTimeout,
        Severity::Critical,
        "Database",
        "2 database timeouts detected",
        2,
    );
    let outcome = store.reconcile(&second).await.expect("reconcile");
    assert_eq!(outcome, ReconcileOutcome::Merged(id));

    let issues = store.open_issues().await.expect("issues");
    assert_eq!(issues.len(), 1);
    let merged = &issues[0];
    assert_eq!(merged.id, id);
    assert_eq!(merged.occurrence_count, 5);
    // first_seen never moves; last_seen does.
    assert_eq!(merged.first_seen, first_seen);
    assert!(merged.last_seen >= created_last_seen);
    // Severity and description take the latest observation's values.
    assert_eq!(merged.severity, "CRITICAL");
    assert_eq!(merged.description, "2 database timeouts detected");
}

#[tokio::test]
async fn merge_can_downgrade_severity() {
    let (_dir, store) = open_temp_db().await;

    let critical = observation(
        IssueType::DatabaseTimeout,
        Severity::Critical,
        "Database",
        "8 database timeouts detected",
        8,
    );
    store.reconcile(&critical).await.expect("reconcile");

    let milder = observation(
        IssueType::DatabaseTimeout,
        Severity::High,
        "Database",
        "1 database timeout detected",
        1,
    );
    store.reconcile(&milder).await.expect("reconcile");

    let issues = store.open_issues().await.expect("issues");
    assert_eq!(issues[0].severity, "HIGH");
    assert_eq!(issues[0].occurrence_count, 9);
}

#[tokio::test]
async fn distinct_components_get_distinct_issues() {
    let (_dir, store) = open_temp_db().await;

    let api = observation(
        IssueType::HighErrorRate,
        Severity::Medium,
        "API",
        "API has 12.0% error rate (12/100 entries)",
        12,
    );
    let auth = observation(
        IssueType::HighErrorRate,
        Severity::Medium,
        "Auth",
        "Auth has 15.0% error rate (15/100 entries)",
        15,
    );
    let first = store.reconcile(&api).await.expect("reconcile");
    let second = store.reconcile(&auth).await.expect("reconcile");

    assert_ne!(first.issue_id(), second.issue_id());
    assert_eq!(store.open_issue_count().await.expect("count"), 2);
}

#[tokio::test]
async fn resolved_issues_are_excluded_from_dedup() {
    let (_dir, store) = open_temp_db().await;

    let obs = observation(
        IssueType::AuthenticationFailures,
        Severity::High,
        "Auth",
        "6 authentication failures detected",
        6,
    );
    let first_id = store.reconcile(&obs).await.expect("reconcile").issue_id();

    assert!(store.mark_resolved(first_id).await.expect("resolve"));
    assert_eq!(store.open_issue_count().await.expect("count"), 0);

    // The same key now creates a fresh issue instead of reopening the old one.
    let second_id = store.reconcile(&obs).await.expect("reconcile").issue_id();
    assert_ne!(first_id, second_id);

    let issues = store.open_issues().await.expect("issues");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].id, second_id);
    assert_eq!(issues[0].occurrence_count, 6);
}

#[tokio::test]
async fn mark_resolved_reports_missing_rows() {
    let (_dir, store) = open_temp_db().await;

    assert!(!store.mark_resolved(42).await.expect("resolve"));
}
