//! Logwarden — log file ingestion and operational issue detection.
//!
//! Tails an application's date-suffixed log files, parses each line into a
//! structured record, evaluates batch heuristics (error rates, database
//! timeouts, slow responses, authentication failures), and maintains
//! deduplicated issues in a SQLite store until an operator resolves them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Configuration loading and validation.
pub mod config;
/// Batch heuristics producing issue observations.
pub mod detector;
/// Synthetic log line producer for local testing.
pub mod generator;
/// Structured logging setup.
pub mod logging;
/// Log line parsing into structured records.
pub mod parser;
/// Ingestion cycle orchestration.
pub mod pipeline;
/// SQLite-backed record and issue persistence.
pub mod store;
/// Log file discovery and offset-tracked tailing.
pub mod tailer;
