//! Log file discovery and offset-tracked tailing.
//!
//! Tracks a byte offset into the current monitored file and yields newly
//! appended lines each poll. Uses synchronous `std::fs` reads since these
//! are quick local operations.

use std::fs;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

/// Tails the lexicographically greatest `<prefix>*.log` file in a directory.
///
/// Holds the tail state: the currently tracked file and the byte offset of
/// the last read. The state lives only for the process lifetime; a restart
/// re-reads the current file from offset 0.
pub struct Tailer {
    log_dir: PathBuf,
    prefix: String,
    current_file: Option<PathBuf>,
    offset: u64,
}

impl Tailer {
    /// Create a new tailer for files matching `<prefix>*.log` under `log_dir`.
    pub fn new(log_dir: PathBuf, prefix: String) -> Self {
        Self {
            log_dir,
            prefix,
            current_file: None,
            offset: 0,
        }
    }

    /// The file currently being tailed, if discovery has found one.
    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    /// Byte offset of the last read into the current file.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Find the current log file: the lexicographically greatest filename
    /// matching `<prefix>*.log`.
    ///
    /// Filename order is a proxy for recency; the producer must use a
    /// sortable date or sequence suffix. Returns `Ok(None)` when the
    /// directory is missing or holds no matching file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn discover_latest(&self) -> anyhow::Result<Option<PathBuf>> {
        if !self.log_dir.exists() {
            return Ok(None);
        }

        let entries = fs::read_dir(&self.log_dir)
            .with_context(|| format!("failed to read log directory {}", self.log_dir.display()))?;

        let mut best: Option<(String, PathBuf)> = None;

        for entry in entries {
            let entry = entry.context("failed to read directory entry")?;
            let path = entry.path();

            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_owned(),
                None => continue,
            };

            if !name.starts_with(&self.prefix) || !name.ends_with(".log") {
                continue;
            }

            if !path.is_file() {
                continue;
            }

            let is_greater = best.as_ref().is_none_or(|(best_name, _)| name > *best_name);

            if is_greater {
                best = Some((name, path));
            }
        }

        Ok(best.map(|(_, path)| path))
    }

    /// Read all bytes appended to `path` since `offset`, split into lines.
    ///
    /// Returns the lines (trailing newlines stripped, empty lines skipped)
    /// and the new end offset. A missing file is not an error: the caller
    /// treats it as "nothing new yet" and gets an empty batch with the
    /// offset unchanged. A truncated same-named file is indistinguishable
    /// from "no new data" — the offset simply sits past the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn read_from(path: &Path, offset: u64) -> anyhow::Result<(Vec<String>, u64)> {
        let file = match fs::File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok((Vec::new(), offset));
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to open log file {}", path.display()));
            }
        };

        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(offset))
            .with_context(|| format!("failed to seek in log file {}", path.display()))?;

        const MAX_LINE_LEN: usize = 1_048_576; // 1 MB safety limit.

        let mut lines = Vec::new();
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader
                .read_line(&mut line)
                .with_context(|| format!("failed to read line from {}", path.display()))?;
            if bytes_read == 0 {
                break;
            }

            if line.len() > MAX_LINE_LEN {
                continue;
            }

            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() {
                continue;
            }

            lines.push(trimmed.to_owned());
        }

        let new_offset = reader
            .stream_position()
            .context("failed to get stream position")?;

        Ok((lines, new_offset))
    }

    /// Poll for newly appended lines since the last call.
    ///
    /// Re-runs discovery each cycle. When the discovered path differs from
    /// the tracked one, the tracked path switches and the offset resets to
    /// 0, so a rotated-in file is read from its start even if it already
    /// contains data. No discovered file yields an empty batch.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery or the file read fails.
    pub fn poll(&mut self) -> anyhow::Result<Vec<String>> {
        let latest = match self.discover_latest()? {
            Some(path) => path,
            None => return Ok(Vec::new()),
        };

        if self.current_file.as_ref() != Some(&latest) {
            info!(file = %latest.display(), "now tailing");
            self.current_file = Some(latest.clone());
            self.offset = 0;
        }

        let (lines, new_offset) = Self::read_from(&latest, self.offset)?;
        self.offset = new_offset;

        Ok(lines)
    }
}
