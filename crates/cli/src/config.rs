// Configuration: clap flags with environment fallback

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use finit_harness_core::application::constants::{
    DEFAULT_POLL_INITIAL_INTERVAL, DEFAULT_POLL_MAX_INTERVAL, DEFAULT_POLL_MULTIPLIER,
    DEFAULT_WAIT_TIMEOUT,
};
use finit_harness_core::port::{ConsoleError, ConsoleWatcher};
use finit_harness_core::{FinitMachine, PollPolicy};
use finit_harness_infra_system::{LogFileConsole, ShellChannel, StartPosition};

use crate::logging::LogFormat;

/// Environment passed through to the transport (ssh needs HOME and the agent socket)
const ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "TERM", "SSH_AUTH_SOCK"];

#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Transport prefix for target commands, e.g. "ssh -o BatchMode=yes root@vm" (empty = local shell)
    #[arg(long, env = "FINIT_HARNESS_TARGET", default_value = "", global = true)]
    pub target: String,

    /// Console log file of the target (needed for runlevel waits)
    #[arg(long, env = "FINIT_HARNESS_CONSOLE_LOG", global = true)]
    pub console_log: Option<String>,

    /// Only match console output written after a wait starts
    #[arg(long, env = "FINIT_HARNESS_CONSOLE_FROM_END", global = true)]
    pub console_from_end: bool,

    /// Default timeout for waits, in seconds
    #[arg(long, env = "FINIT_HARNESS_TIMEOUT_SECS", default_value_t = DEFAULT_WAIT_TIMEOUT.as_secs(), global = true)]
    pub timeout_secs: u64,

    /// Kill a single target command after this many seconds
    #[arg(long, env = "FINIT_HARNESS_COMMAND_TIMEOUT_SECS", global = true)]
    pub command_timeout_secs: Option<u64>,

    /// First delay between condition queries, in milliseconds
    #[arg(long, env = "FINIT_HARNESS_POLL_INITIAL_MS", default_value_t = DEFAULT_POLL_INITIAL_INTERVAL.as_millis() as u64, global = true)]
    pub poll_initial_ms: u64,

    /// Maximum delay between condition queries, in milliseconds
    #[arg(long, env = "FINIT_HARNESS_POLL_MAX_MS", default_value_t = DEFAULT_POLL_MAX_INTERVAL.as_millis() as u64, global = true)]
    pub poll_max_ms: u64,

    /// Log output format
    #[arg(long, env = "FINIT_HARNESS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub transport: Vec<String>,
    pub console_log: Option<PathBuf>,
    pub console_start: StartPosition,
    pub default_timeout: Duration,
    pub command_timeout: Option<Duration>,
    pub poll_policy: PollPolicy,
}

impl HarnessConfig {
    pub fn from_args(args: &TargetArgs) -> Result<Self> {
        let console_log = args
            .console_log
            .as_deref()
            .map(|path| {
                shellexpand::full(path)
                    .map(|expanded| PathBuf::from(expanded.into_owned()))
                    .with_context(|| format!("Invalid console log path '{path}'"))
            })
            .transpose()?;

        Ok(Self {
            transport: args.target.split_whitespace().map(str::to_string).collect(),
            console_log,
            console_start: if args.console_from_end {
                StartPosition::End
            } else {
                StartPosition::Beginning
            },
            default_timeout: Duration::from_secs(args.timeout_secs),
            command_timeout: args.command_timeout_secs.map(Duration::from_secs),
            poll_policy: PollPolicy::new(
                Duration::from_millis(args.poll_initial_ms),
                DEFAULT_POLL_MULTIPLIER,
                Duration::from_millis(args.poll_max_ms),
            ),
        })
    }

    /// Wire the adapters into a machine
    pub fn build_machine(&self) -> FinitMachine {
        let env_allowlist = ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect();
        let mut channel = ShellChannel::with_transport(self.transport.clone(), env_allowlist);
        if let Some(limit) = self.command_timeout {
            channel = channel.with_command_timeout(limit);
        }

        let console: Arc<dyn ConsoleWatcher> = match &self.console_log {
            Some(path) => Arc::new(LogFileConsole::new(path).with_start(self.console_start)),
            None => Arc::new(NoConsole),
        };

        FinitMachine::new(Arc::new(channel), console)
            .with_poll_policy(self.poll_policy)
            .with_default_timeout(self.default_timeout)
    }
}

/// Console used when no log file is configured
struct NoConsole;

#[async_trait]
impl ConsoleWatcher for NoConsole {
    async fn wait_for_text(&self, _text: &str, _timeout: Duration) -> Result<(), ConsoleError> {
        Err(ConsoleError::Unavailable(
            "no console log configured (set --console-log or FINIT_HARNESS_CONSOLE_LOG)"
                .to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        target: TargetArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::try_parse_from(["finit-wait"]).unwrap();
        let config = HarnessConfig::from_args(&cli.target).unwrap();

        assert!(config.transport.is_empty());
        assert_eq!(config.default_timeout, DEFAULT_WAIT_TIMEOUT);
        assert_eq!(config.poll_policy, PollPolicy::default());
        assert_eq!(config.console_start, StartPosition::Beginning);
    }

    #[test]
    fn test_transport_split() {
        let cli = TestCli::try_parse_from([
            "finit-wait",
            "--target",
            "ssh -o BatchMode=yes root@vm",
            "--timeout-secs",
            "30",
        ])
        .unwrap();
        let config = HarnessConfig::from_args(&cli.target).unwrap();

        assert_eq!(config.transport, vec!["ssh", "-o", "BatchMode=yes", "root@vm"]);
        assert_eq!(config.default_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_no_console_is_unavailable() {
        let err = NoConsole
            .wait_for_text("entering runlevel 2", Duration::from_secs(1))
            .await
            .unwrap_err();

        assert!(matches!(err, ConsoleError::Unavailable(_)));
    }
}
