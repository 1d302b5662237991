//! Rotation-tolerant log file tailing.
//!
//! [`LogTailer`] yields lines appended to a file after the tailer starts,
//! like `tail -f`. It survives the file being truncated, rotated away, or
//! missing entirely: the underlying resource is treated as a logically
//! continuous append-only stream, and reopening is driven by identity checks
//! (size shrink everywhere, inode comparison on unix) rather than any
//! specific rotation tool's behavior.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader, SeekFrom};
use tracing::{debug, info, warn};

use crate::error::{Result, TailError};

/// Configuration for a [`LogTailer`].
#[derive(Debug, Clone)]
pub struct TailerConfig {
    /// Path of the log file to follow.
    pub path: PathBuf,
    /// Sleep between polls when no new data is available.
    pub poll_interval: Duration,
    /// Upper bound for the open-retry backoff.
    pub max_backoff: Duration,
}

impl TailerConfig {
    /// Creates a config with the default 100 ms poll interval.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
        }
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the maximum open-retry backoff.
    #[must_use]
    pub const fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }
}

/// An open handle on the tailed file plus the bookkeeping needed to notice
/// that the path no longer refers to it.
struct OpenFile {
    reader: BufReader<File>,
    /// Bytes consumed so far; a path length below this means truncation.
    pos: u64,
    /// Inode of the open file on unix, 0 elsewhere.
    id: u64,
}

/// Follows a growing log file, yielding complete lines as they are appended.
///
/// The tailer never fails outward: open and read errors are logged and
/// retried with capped backoff, so [`next_line`](Self::next_line) only ever
/// suspends, it does not return errors. This is the pipeline's sole
/// suspension point besides alert delivery.
pub struct LogTailer {
    config: TailerConfig,
    file: Option<OpenFile>,
    /// Accumulates a line across reads until its newline arrives.
    pending: String,
    /// Whether the next open should read from the start of the file
    /// (post-rotation) instead of seeking to the end (initial open).
    from_start: bool,
    /// Identity and position of a handle dropped on a transient read
    /// failure, so an unchanged file is resumed rather than replayed.
    resume: Option<(u64, u64)>,
    backoff: Duration,
}

impl LogTailer {
    /// Starts tailing at the current end of the file.
    ///
    /// A missing or unreadable file is not an error: the tailer keeps
    /// retrying in [`next_line`](Self::next_line), and a file that appears
    /// later is read from its beginning since all of its content postdates
    /// the start of the tailer.
    pub async fn start(config: TailerConfig) -> Self {
        let mut tailer = Self {
            backoff: config.poll_interval,
            config,
            file: None,
            pending: String::new(),
            from_start: false,
            resume: None,
        };

        match tailer.open().await {
            Ok(()) => info!(path = %tailer.config.path.display(), "tailing log file"),
            Err(e) => {
                warn!(error = %e, "log file not yet readable, will retry");
                tailer.from_start = true;
            }
        }
        tailer
    }

    /// Returns the path being tailed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Returns the next complete, non-empty line appended to the file.
    ///
    /// Suspends while no data is available; recovers transparently from
    /// rotation, truncation, and transient I/O failures.
    pub async fn next_line(&mut self) -> String {
        loop {
            if self.file.is_none() {
                if let Err(e) = self.open().await {
                    warn!(error = %e, backoff_ms = self.backoff.as_millis() as u64, "retrying open");
                    tokio::time::sleep(self.backoff).await;
                    self.backoff = (self.backoff * 2).min(self.config.max_backoff);
                    continue;
                }
                self.backoff = self.config.poll_interval;
            }

            // Unwrap-free: the branch above guarantees an open file here.
            let Some(open) = self.file.as_mut() else {
                continue;
            };

            match open.reader.read_line(&mut self.pending).await {
                Ok(0) => {
                    if self.check_rotation().await {
                        // any unterminated tail of the old file is complete now
                        if let Some(line) = self.take_pending() {
                            return line;
                        }
                        continue;
                    }
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                Ok(n) => {
                    open.pos += n as u64;
                    if self.pending.ends_with('\n') {
                        if let Some(line) = self.take_pending() {
                            return line;
                        }
                    }
                    // otherwise a partial line: keep accumulating
                }
                Err(e) => {
                    warn!(
                        error = %TailError::Read {
                            path: self.config.path.clone(),
                            source: e,
                        },
                        "read failed, reopening"
                    );
                    // remember where we were so an unchanged file is not replayed
                    if let Some(open) = self.file.take() {
                        self.resume = Some((open.id, open.pos));
                    }
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
    }

    /// Opens the file, recording position and identity.
    ///
    /// The initial open seeks to the end; later opens read from the start,
    /// except that a handle dropped on a transient read failure resumes at
    /// its saved position when the file identity is unchanged (a shrunken
    /// file means replacement, so that still restarts from offset 0).
    async fn open(&mut self) -> Result<()> {
        let file = File::open(&self.config.path).await.map_err(|e| TailError::Open {
            path: self.config.path.clone(),
            source: e,
        })?;

        let meta = file.metadata().await.map_err(|e| TailError::Open {
            path: self.config.path.clone(),
            source: e,
        })?;
        let id = file_id(&meta);

        let whence = if self.from_start {
            match self.resume.take() {
                Some((saved_id, saved_pos)) if saved_id == id && meta.len() >= saved_pos => {
                    SeekFrom::Start(saved_pos)
                }
                _ => SeekFrom::Start(0),
            }
        } else {
            SeekFrom::End(0)
        };

        let mut reader = BufReader::new(file);
        let pos = reader.seek(whence).await.map_err(|e| TailError::Open {
            path: self.config.path.clone(),
            source: e,
        })?;

        self.file = Some(OpenFile { reader, pos, id });
        // after the first successful open every reopen is rotation-driven
        self.from_start = true;
        Ok(())
    }

    /// At EOF, checks whether the path no longer refers to the data we were
    /// reading. Drops the handle (forcing a reopen from the start) when the
    /// file shrank below our read position or changed identity. A path that
    /// cannot be statted is left alone until a stat succeeds again.
    async fn check_rotation(&mut self) -> bool {
        let Some(open) = self.file.as_ref() else {
            return false;
        };

        match tokio::fs::metadata(&self.config.path).await {
            Ok(meta) => {
                let truncated = meta.len() < open.pos;
                let replaced = open.id != 0 && file_id(&meta) != open.id;
                if truncated || replaced {
                    info!(
                        path = %self.config.path.display(),
                        truncated,
                        replaced,
                        "log file rotated, reopening from start"
                    );
                    self.file = None;
                    return true;
                }
                false
            }
            Err(e) => {
                // A renamed-away file stays readable through the open handle,
                // and a genuine replacement shows up on a later stat with a
                // different identity. Dropping here would replay the file.
                debug!(error = %e, "log path not statable, keeping current handle");
                false
            }
        }
    }

    /// Drains the pending buffer, returning it as a trimmed line if it holds
    /// anything beyond whitespace.
    fn take_pending(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.pending);
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.trim().is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[cfg(unix)]
fn file_id(meta: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.ino()
}

#[cfg(not(unix))]
fn file_id(_meta: &std::fs::Metadata) -> u64 {
    0
}
