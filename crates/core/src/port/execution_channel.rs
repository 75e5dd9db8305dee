// Execution Channel Port
// Abstraction for running one command line inside the test target

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Exit status and captured output of one command.
///
/// A non-zero exit code is a normal result, not an error: the channel only
/// fails when the command could not be run at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    exit_code: i32,
    output: String,
}

impl ExecutionResult {
    pub fn new(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: output.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    pub fn into_parts(self) -> (i32, String) {
        (self.exit_code, self.output)
    }
}

/// Channel errors (the command never produced an exit status)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Command timeout after {0}ms")]
    Timeout(u64),

    #[error("Command terminated without exit status: {0}")]
    Terminated(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Execution Channel trait
///
/// Implementations:
/// - ShellChannel: runs the command via `sh -c`, optionally behind a transport (ssh, ...)
/// - MockExecutionChannel: scripted responses for tests
#[async_trait]
pub trait ExecutionChannel: Send + Sync {
    /// Run `command` in the target and wait for it to exit
    ///
    /// # Errors
    /// - ChannelError::SpawnFailed if the command (or transport) cannot be started
    /// - ChannelError::Timeout if the channel's own per-command limit is hit
    async fn execute(&self, command: &str) -> Result<ExecutionResult, ChannelError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock channel behavior for commands without an explicit response
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Every command exits with this code and empty output
        ExitWith(i32),
        /// The first N commands exit 1, every later one exits 0
        SucceedAfter(usize),
        /// Every command fails at the channel level
        Fail(ChannelError),
        /// Like `SucceedAfter`, but every command takes `latency` to finish
        Slow { latency: Duration, failures: usize },
        /// Every command blocks forever
        Hang,
    }

    /// Mock Execution Channel for testing
    ///
    /// Records every command line it receives, in order.
    pub struct MockExecutionChannel {
        behavior: Arc<Mutex<MockBehavior>>,
        responses: Arc<Mutex<HashMap<String, ExecutionResult>>>,
        commands: Arc<Mutex<Vec<String>>>,
    }

    impl MockExecutionChannel {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                responses: Arc::new(Mutex::new(HashMap::new())),
                commands: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockBehavior::ExitWith(0))
        }

        pub fn new_exit(code: i32) -> Self {
            Self::new(MockBehavior::ExitWith(code))
        }

        pub fn new_succeed_after(failures: usize) -> Self {
            Self::new(MockBehavior::SucceedAfter(failures))
        }

        /// Fixed response for one exact command line
        pub fn with_response(
            self,
            command: impl Into<String>,
            exit_code: i32,
            output: impl Into<String>,
        ) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(command.into(), ExecutionResult::new(exit_code, output));
            self
        }

        pub fn set_behavior(&self, behavior: MockBehavior) {
            *self.behavior.lock().unwrap() = behavior;
        }

        pub fn call_count(&self) -> usize {
            self.commands.lock().unwrap().len()
        }

        pub fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExecutionChannel for MockExecutionChannel {
        async fn execute(&self, command: &str) -> Result<ExecutionResult, ChannelError> {
            let call_index = {
                let mut commands = self.commands.lock().unwrap();
                commands.push(command.to_string());
                commands.len() - 1
            };

            let scripted = self.responses.lock().unwrap().get(command).cloned();
            if let Some(result) = scripted {
                return Ok(result);
            }

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::ExitWith(code) => Ok(ExecutionResult::new(code, "")),
                MockBehavior::SucceedAfter(failures) => {
                    let code = if call_index < failures { 1 } else { 0 };
                    Ok(ExecutionResult::new(code, ""))
                }
                MockBehavior::Fail(err) => Err(err),
                MockBehavior::Slow { latency, failures } => {
                    tokio::time::sleep(latency).await;
                    let code = if call_index < failures { 1 } else { 0 };
                    Ok(ExecutionResult::new(code, ""))
                }
                MockBehavior::Hang => std::future::pending().await,
            }
        }
    }
}
