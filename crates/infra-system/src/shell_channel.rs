// Shell execution channel
// reason: tokio for async process management with kill-on-timeout
use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use finit_harness_core::port::execution_channel::{
    ChannelError, ExecutionChannel, ExecutionResult,
};

/// Runs command lines through a shell, locally or behind a transport.
///
/// With an empty transport the command runs as `sh -c <command>` on this
/// host. With a transport such as `["ssh", "-o", "BatchMode=yes", "root@vm"]`
/// the command line is appended as the final argument and the transport is
/// responsible for handing it to the target's shell.
///
/// Only allowlisted environment variables are passed to the child.
pub struct ShellChannel {
    transport: Vec<String>,
    env_allowlist: Vec<String>,
    command_timeout: Option<Duration>,
}

impl ShellChannel {
    /// Create a channel running commands on this host
    ///
    /// # Example
    /// ```ignore
    /// let channel = ShellChannel::local(vec!["PATH".to_string(), "HOME".to_string()]);
    /// ```
    pub fn local(env_allowlist: Vec<String>) -> Self {
        Self::with_transport(Vec::new(), env_allowlist)
    }

    /// Create a channel that prefixes every command with `transport`
    pub fn with_transport(transport: Vec<String>, env_allowlist: Vec<String>) -> Self {
        Self {
            transport,
            env_allowlist,
            command_timeout: None,
        }
    }

    /// Kill any single command still running after `limit`
    pub fn with_command_timeout(mut self, limit: Duration) -> Self {
        self.command_timeout = Some(limit);
        self
    }

    pub fn transport(&self) -> &[String] {
        &self.transport
    }

    /// Filter environment variables to allowlist only
    fn filter_env(&self, env: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
        env.into_iter()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .collect()
    }

    fn build_command(&self, command_line: &str) -> Command {
        let mut command = match self.transport.split_first() {
            Some((program, args)) => {
                let mut c = Command::new(program);
                c.args(args).arg(command_line);
                c
            }
            None => {
                let mut c = Command::new("sh");
                c.arg("-c").arg(command_line);
                c
            }
        };

        command
            .env_clear()
            .envs(self.filter_env(std::env::vars()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    /// Spawn child process and wait for output
    async fn spawn_and_wait(&self, command_line: &str) -> Result<std::process::Output, ChannelError> {
        let child = self
            .build_command(command_line)
            .spawn()
            .map_err(|e| ChannelError::SpawnFailed(e.to_string()))?;

        match self.command_timeout {
            Some(limit) => match timeout(limit, child.wait_with_output()).await {
                Ok(Ok(output)) => Ok(output),
                Ok(Err(e)) => Err(ChannelError::IoError(e.to_string())),
                // child is dropped with the future and killed
                Err(_) => Err(ChannelError::Timeout(limit.as_millis() as u64)),
            },
            None => child
                .wait_with_output()
                .await
                .map_err(|e| ChannelError::IoError(e.to_string())),
        }
    }

    /// Build execution result from process output
    fn build_result(&self, output: std::process::Output) -> Result<ExecutionResult, ChannelError> {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            debug!(stderr = %stderr.trim_end(), "Command wrote to stderr");
        }

        let exit_code = output.status.code().ok_or_else(|| {
            ChannelError::Terminated(format!("process ended by signal ({})", output.status))
        })?;

        Ok(ExecutionResult::new(
            exit_code,
            String::from_utf8_lossy(&output.stdout),
        ))
    }
}

#[async_trait]
impl ExecutionChannel for ShellChannel {
    async fn execute(&self, command_line: &str) -> Result<ExecutionResult, ChannelError> {
        let started = Instant::now();

        debug!(
            command = %command_line,
            transport = ?self.transport,
            timeout_ms = ?self.command_timeout.map(|t| t.as_millis() as u64),
            "Starting command"
        );

        let output = self.spawn_and_wait(command_line).await?;
        let result = self.build_result(output)?;

        info!(
            command = %command_line,
            duration_ms = started.elapsed().as_millis() as u64,
            exit_code = result.exit_code(),
            "Command completed"
        );

        Ok(result)
    }
}
