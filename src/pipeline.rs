//! Ingestion cycle orchestration.
//!
//! One logical thread of control: discover the current file, tail new
//! lines, parse, persist the batch, detect issues over exactly that batch,
//! reconcile each observation, sleep, repeat. Cancellation is cooperative
//! and takes effect only at the cycle boundary, never mid-I/O.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::LogwardenConfig;
use crate::store::{IssueStore, ReconcileOutcome};
use crate::tailer::Tailer;
use crate::{detector, parser};

/// Drives the tail → parse → persist → detect → reconcile cycle.
pub struct IngestionLoop {
    config: LogwardenConfig,
    tailer: Tailer,
    store: Arc<IssueStore>,
}

impl IngestionLoop {
    /// Create a new loop over the configured directory and store.
    pub fn new(config: LogwardenConfig, store: Arc<IssueStore>) -> Self {
        let tailer = Tailer::new(
            config.monitor.log_dir.clone(),
            config.monitor.file_prefix.clone(),
        );
        Self {
            config,
            tailer,
            store,
        }
    }

    /// Run cycles at the configured interval until shutdown is signalled.
    ///
    /// A failed cycle is logged and the loop proceeds to the next one; the
    /// failed batch is not retried. The shutdown receiver is checked only
    /// between cycles.
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok` on shutdown; the signature leaves room
    /// for fatal loop-level failures.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
            self.config.checks.interval_secs,
        ));

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {}
            }

            if *shutdown.borrow() {
                info!("shutdown requested, stopping ingestion loop");
                return Ok(());
            }

            if let Err(e) = self.run_cycle().await {
                warn!(error = %e, "ingestion cycle failed");
            }
        }
    }

    /// Run a single ingestion cycle.
    ///
    /// A batch is the set of lines appended since the previous cycle. Lines
    /// that fail to parse are dropped silently; the batch is persisted in
    /// one transaction before detection runs. If persistence fails the
    /// cycle stops there — the batch's records and any issues it would have
    /// raised are lost.
    ///
    /// # Errors
    ///
    /// Returns an error if tailing or the bulk insert fails.
    pub async fn run_cycle(&mut self) -> anyhow::Result<()> {
        let lines = self.tailer.poll().context("failed to poll log file")?;

        if lines.is_empty() {
            debug!("no new log lines");
            return Ok(());
        }

        let mut records = Vec::new();
        let mut dropped: usize = 0;

        for line in &lines {
            match parser::parse_line(line) {
                Ok(record) => records.push(record),
                Err(_) => dropped = dropped.saturating_add(1),
            }
        }

        debug!(
            read = lines.len(),
            parsed = records.len(),
            dropped,
            "batch assembled"
        );

        if records.is_empty() {
            return Ok(());
        }

        self.store
            .insert_records(&records)
            .await
            .context("failed to persist log entry batch")?;

        let observations = detector::detect(&records, &self.config.thresholds);

        for observation in &observations {
            match self.store.reconcile(observation).await {
                Ok(ReconcileOutcome::Created(id)) => {
                    info!(
                        issue_id = id,
                        issue_type = observation.issue_type.as_str(),
                        severity = observation.severity.as_str(),
                        component = %observation.component,
                        "new issue"
                    );
                }
                Ok(ReconcileOutcome::Merged(id)) => {
                    info!(
                        issue_id = id,
                        issue_type = observation.issue_type.as_str(),
                        added = observation.occurrence_count,
                        "issue updated"
                    );
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        issue_type = observation.issue_type.as_str(),
                        "issue reconciliation failed"
                    );
                }
            }
        }

        Ok(())
    }
}
