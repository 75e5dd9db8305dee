// Console Watcher Port
// Blocking wait for a line of console/log text from the target

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Text not seen within {0:?}")]
    Timeout(Duration),

    #[error("Console unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Console Watcher trait
///
/// Implementations:
/// - LogFileConsole: follows a console log file written by the VM runner
/// - MockConsole: emits scheduled lines for tests
#[async_trait]
pub trait ConsoleWatcher: Send + Sync {
    /// Block until a console line containing `text` appears
    ///
    /// # Errors
    /// - ConsoleError::Timeout if no such line appears within `timeout`
    /// - ConsoleError::Unavailable / IoError if the console cannot be read
    async fn wait_for_text(&self, text: &str, timeout: Duration) -> Result<(), ConsoleError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock console that emits lines at fixed offsets.
    ///
    /// Offsets are measured from the start of each `wait_for_text` call.
    pub struct MockConsole {
        lines: Arc<Mutex<Vec<(Duration, String)>>>,
        wait_count: Arc<Mutex<usize>>,
    }

    impl MockConsole {
        pub fn new() -> Self {
            Self {
                lines: Arc::new(Mutex::new(Vec::new())),
                wait_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn with_line(self, at: Duration, line: impl Into<String>) -> Self {
            self.lines.lock().unwrap().push((at, line.into()));
            self
        }

        pub fn wait_count(&self) -> usize {
            *self.wait_count.lock().unwrap()
        }
    }

    impl Default for MockConsole {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ConsoleWatcher for MockConsole {
        async fn wait_for_text(&self, text: &str, timeout: Duration) -> Result<(), ConsoleError> {
            *self.wait_count.lock().unwrap() += 1;

            let first_match = self
                .lines
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, line)| line.contains(text))
                .map(|(at, _)| *at)
                .min();

            match first_match {
                Some(at) if at <= timeout => {
                    tokio::time::sleep(at).await;
                    Ok(())
                }
                _ => {
                    tokio::time::sleep(timeout).await;
                    Err(ConsoleError::Timeout(timeout))
                }
            }
        }
    }
}
