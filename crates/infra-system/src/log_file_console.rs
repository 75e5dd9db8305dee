//! Console watcher backed by a log file
//!
//! VM runners usually tee the serial console to a file. `LogFileConsole`
//! follows that file and returns as soon as new content contains the awaited
//! text. The file may not exist yet when the wait starts; that is treated as
//! "no output so far".

use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::time::Instant;
use tracing::{debug, info};

use finit_harness_core::port::console::{ConsoleError, ConsoleWatcher};

/// Default delay between two reads of the log file
pub const DEFAULT_FOLLOW_INTERVAL: Duration = Duration::from_millis(100);

/// Where scanning starts when a wait begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartPosition {
    /// Everything the console printed so far counts
    #[default]
    Beginning,
    /// Only output written after the wait started counts
    End,
}

pub struct LogFileConsole {
    path: PathBuf,
    start: StartPosition,
    follow_interval: Duration,
}

impl LogFileConsole {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            start: StartPosition::default(),
            follow_interval: DEFAULT_FOLLOW_INTERVAL,
        }
    }

    pub fn with_start(mut self, start: StartPosition) -> Self {
        self.start = start;
        self
    }

    pub fn with_follow_interval(mut self, interval: Duration) -> Self {
        self.follow_interval = interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn current_len(&self) -> Result<u64, ConsoleError> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(ConsoleError::IoError(e.to_string())),
        }
    }

    /// Read everything after `offset`; `None` while the file does not exist
    async fn read_from(&self, offset: u64) -> Result<Option<Vec<u8>>, ConsoleError> {
        let mut file = match tokio::fs::File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConsoleError::IoError(e.to_string())),
        };

        file.seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| ConsoleError::IoError(e.to_string()))?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .await
            .map_err(|e| ConsoleError::IoError(e.to_string()))?;
        Ok(Some(buf))
    }
}

/// Carry-over window for matching `needle` across reads.
///
/// Matching is done on raw bytes, so a UTF-8 sequence split between two
/// reads still matches, and only the last `needle.len() - 1` bytes are kept
/// between reads.
struct MatchWindow<'a> {
    needle: &'a [u8],
    tail: Vec<u8>,
}

impl<'a> MatchWindow<'a> {
    fn new(needle: &'a str) -> Self {
        Self {
            needle: needle.as_bytes(),
            tail: Vec::new(),
        }
    }

    /// Append freshly read bytes; true once the needle has been seen
    fn feed(&mut self, bytes: &[u8]) -> bool {
        if self.needle.is_empty() {
            return true;
        }

        self.tail.extend_from_slice(bytes);
        if self
            .tail
            .windows(self.needle.len())
            .any(|window| window == self.needle)
        {
            return true;
        }

        let keep = self.needle.len() - 1;
        if self.tail.len() > keep {
            self.tail.drain(..self.tail.len() - keep);
        }
        false
    }

    fn clear(&mut self) {
        self.tail.clear();
    }
}

#[async_trait]
impl ConsoleWatcher for LogFileConsole {
    async fn wait_for_text(&self, text: &str, timeout: Duration) -> Result<(), ConsoleError> {
        let start = Instant::now();
        let mut offset = match self.start {
            StartPosition::Beginning => 0,
            StartPosition::End => self.current_len().await?,
        };
        let mut window = MatchWindow::new(text);

        debug!(
            path = %self.path.display(),
            text = %text,
            offset = offset,
            "Following console log"
        );

        loop {
            if self.current_len().await? < offset {
                debug!(path = %self.path.display(), "Console log truncated, rescanning");
                offset = 0;
                window.clear();
            }

            if let Some(bytes) = self.read_from(offset).await? {
                offset += bytes.len() as u64;

                if window.feed(&bytes) {
                    info!(path = %self.path.display(), text = %text, "Console text found");
                    return Ok(());
                }
            }

            let remaining = timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                return Err(ConsoleError::Timeout(timeout));
            }
            tokio::time::sleep(self.follow_interval.min(remaining)).await;
        }
    }
}
