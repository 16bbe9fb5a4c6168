//! SQLite-backed record and issue persistence.
//!
//! Stores parsed log entries and deduplicated issues. Migration is applied
//! inline via `include_str!` on first open. Issue reconciliation maintains
//! the invariant of at most one unresolved issue per
//! `(issue_type, component)` pair.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::detector::IssueObservation;
use crate::parser::LogRecord;

/// Logwarden's SQLite store for log entries and issues.
pub struct IssueStore {
    pool: SqlitePool,
}

/// A durable, deduplicated issue row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedIssue {
    /// Auto-increment row ID.
    pub id: i64,
    /// Issue type key (e.g. `database_timeout`).
    pub issue_type: String,
    /// Severity as last observed (`MEDIUM`/`HIGH`/`CRITICAL`).
    pub severity: String,
    /// Description as last observed.
    pub description: String,
    /// Component the issue is scoped to.
    pub component: String,
    /// When the issue was first created (RFC 3339).
    pub first_seen: String,
    /// When the issue was last merged into (RFC 3339).
    pub last_seen: String,
    /// Cumulative occurrence count across all batches.
    pub occurrence_count: i64,
    /// Whether an operator has resolved the issue.
    pub resolved: bool,
}

/// Result of reconciling one observation against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No unresolved issue existed; a new row was created.
    Created(i64),
    /// An unresolved issue existed; counts and timestamps were merged.
    Merged(i64),
}

impl ReconcileOutcome {
    /// The ID of the created or merged issue row.
    pub fn issue_id(self) -> i64 {
        match self {
            Self::Created(id) | Self::Merged(id) => id,
        }
    }
}

impl IssueStore {
    /// Open (or create) the store at the given path and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migration fails.
    /// Callers must treat this as fatal at startup: the ingestion loop must
    /// not run without a working store.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        // Ensure parent directory exists.
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create db directory {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .pragma("trusted_schema", "OFF")
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open store at {}", path.display()))?;

        let migration_sql = include_str!("../migrations/001_logwarden_schema.sql");
        sqlx::raw_sql(migration_sql)
            .execute(&pool)
            .await
            .context("failed to apply logwarden schema migration")?;

        Ok(Self { pool })
    }

    /// Bulk-insert a batch of parsed records in a single transaction.
    ///
    /// All-or-nothing: if any insert fails the transaction rolls back and no
    /// record from the batch is persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be committed.
    pub async fn insert_records(&self, records: &[LogRecord]) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin log entry transaction")?;

        for record in records {
            sqlx::query(
                "INSERT INTO log_entries
                 (log_timestamp, log_level, component, message, response_time_ms, error_code, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&record.timestamp)
            .bind(&record.level)
            .bind(&record.component)
            .bind(&record.message)
            .bind(record.response_time_ms)
            .bind(&record.error_code)
            .bind(record.user_id)
            .execute(&mut *tx)
            .await
            .context("failed to insert log entry")?;
        }

        tx.commit()
            .await
            .context("failed to commit log entry batch")?;

        Ok(())
    }

    /// Reconcile an observation against previously persisted issues.
    ///
    /// Looks up the most-recently-updated unresolved issue with the same
    /// `(issue_type, component)`. If found, merges: the occurrence count is
    /// added, `last_seen` moves to now, and severity and description are
    /// overwritten with the observation's values (last write wins, even if
    /// milder). Otherwise creates a new unresolved issue with
    /// `first_seen = last_seen = now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup or write fails.
    pub async fn reconcile(
        &self,
        observation: &IssueObservation,
    ) -> anyhow::Result<ReconcileOutcome> {
        let now = chrono::Utc::now().to_rfc3339();

        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM issues
             WHERE issue_type = ?1 AND component = ?2 AND resolved = 0
             ORDER BY last_seen DESC
             LIMIT 1",
        )
        .bind(observation.issue_type.as_str())
        .bind(&observation.component)
        .fetch_optional(&self.pool)
        .await
        .context("failed to look up unresolved issue")?;

        if let Some((id,)) = existing {
            // Count is accumulated inside the statement so concurrent
            // observations for the same key cannot lose an update.
            sqlx::query(
                "UPDATE issues SET
                    occurrence_count = occurrence_count + ?2,
                    last_seen = ?3,
                    severity = ?4,
                    description = ?5
                 WHERE id = ?1",
            )
            .bind(id)
            .bind(observation.occurrence_count)
            .bind(&now)
            .bind(observation.severity.as_str())
            .bind(&observation.description)
            .execute(&self.pool)
            .await
            .context("failed to merge issue")?;

            Ok(ReconcileOutcome::Merged(id))
        } else {
            let result = sqlx::query(
                "INSERT INTO issues
                 (issue_type, severity, description, component, first_seen, last_seen, occurrence_count, resolved)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
            )
            .bind(observation.issue_type.as_str())
            .bind(observation.severity.as_str())
            .bind(&observation.description)
            .bind(&observation.component)
            .bind(&now)
            .bind(&now)
            .bind(observation.occurrence_count)
            .execute(&self.pool)
            .await
            .context("failed to create issue")?;

            Ok(ReconcileOutcome::Created(result.last_insert_rowid()))
        }
    }

    /// List all unresolved issues, most recently seen first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    pub async fn open_issues(&self) -> anyhow::Result<Vec<PersistedIssue>> {
        let rows: Vec<IssueRow> = sqlx::query_as(
            "SELECT id, issue_type, severity, description, component,
                    first_seen, last_seen, occurrence_count, resolved
             FROM issues
             WHERE resolved = 0
             ORDER BY last_seen DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to query open issues")?;

        Ok(rows.into_iter().map(issue_row_into_record).collect())
    }

    /// Mark an issue as resolved. Returns whether a row was updated.
    ///
    /// This is the external operator action — the ingestion loop never
    /// resolves issues itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn mark_resolved(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE issues SET resolved = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to mark issue resolved")?;

        Ok(result.rows_affected() > 0)
    }

    /// Total number of persisted log entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    pub async fn log_entry_count(&self) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM log_entries")
            .fetch_one(&self.pool)
            .await
            .context("failed to count log entries")?;

        Ok(count)
    }

    /// Number of unresolved issues.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    pub async fn open_issue_count(&self) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM issues WHERE resolved = 0")
            .fetch_one(&self.pool)
            .await
            .context("failed to count open issues")?;

        Ok(count)
    }

    /// Query the most recently inserted log entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    pub async fn recent_entries(&self, limit: i64) -> anyhow::Result<Vec<LogRecord>> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT log_timestamp, log_level, component, message,
                    response_time_ms, error_code, user_id
             FROM log_entries
             ORDER BY id DESC
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("failed to query recent log entries")?;

        Ok(rows.into_iter().map(entry_row_into_record).collect())
    }
}

/// Raw row tuple from the `issues` table.
type IssueRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    String,
    i64,
    i64,
);

/// Convert a raw `issues` row tuple into a [`PersistedIssue`].
fn issue_row_into_record(row: IssueRow) -> PersistedIssue {
    let (
        id,
        issue_type,
        severity,
        description,
        component,
        first_seen,
        last_seen,
        occurrence_count,
        resolved,
    ) = row;
    PersistedIssue {
        id,
        issue_type,
        severity,
        description,
        component,
        first_seen,
        last_seen,
        occurrence_count,
        resolved: resolved != 0,
    }
}

/// Raw row tuple from the `log_entries` table.
type EntryRow = (
    String,
    String,
    String,
    String,
    Option<i64>,
    Option<String>,
    Option<i64>,
);

/// Convert a raw `log_entries` row tuple into a [`LogRecord`].
fn entry_row_into_record(row: EntryRow) -> LogRecord {
    let (timestamp, level, component, message, response_time_ms, error_code, user_id) = row;
    LogRecord {
        timestamp,
        level,
        component,
        message,
        response_time_ms,
        user_id,
        error_code,
    }
}
