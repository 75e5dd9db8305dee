//! FinitMachine - drives finit inside a test target
//!
//! Two observation disciplines:
//! - condition polling: `initctl cond get <condition>` until exit 0 or deadline
//! - console matching: block until `entering runlevel N` shows up or deadline
//!
//! Lifecycle dispatches (`start_service`, ...) run once and hand back the raw
//! exit status and output; a non-zero exit is the caller's to interpret.
//!
//! There are intentionally no `wait_for_unit`, `systemctl` or `get_unit_info`
//! methods. Code written against the systemd driver fails to compile:
//!
//! ```compile_fail
//! # use finit_harness_core::FinitMachine;
//! # async fn check(machine: &FinitMachine) {
//! machine.systemctl("status nginx").await;
//! # }
//! ```

use super::constants::{DEFAULT_WAIT_TIMEOUT, MIN_QUERY_BUDGET};
use super::poll::PollPolicy;
use crate::domain::{Condition, ControlVerb, EntityName, InitctlCommand, Runlevel};
use crate::error::{HarnessError, Result};
use crate::port::{ConsoleError, ConsoleWatcher, ExecutionChannel, ExecutionResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Successful wait report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOutcome {
    /// Queries issued (always 1 for console waits)
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Stateless adapter between test intents and a finit target
pub struct FinitMachine {
    channel: Arc<dyn ExecutionChannel>,
    console: Arc<dyn ConsoleWatcher>,
    poll_policy: PollPolicy,
    default_timeout: Duration,
}

impl FinitMachine {
    pub fn new(channel: Arc<dyn ExecutionChannel>, console: Arc<dyn ConsoleWatcher>) -> Self {
        Self {
            channel,
            console,
            poll_policy: PollPolicy::default(),
            default_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }

    pub fn with_poll_policy(mut self, poll_policy: PollPolicy) -> Self {
        self.poll_policy = poll_policy;
        self
    }

    /// Timeout used by scenario steps that do not set their own
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll_policy
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    // ------------------------------------------------------------------
    // Waits (assertions: raise on timeout)
    // ------------------------------------------------------------------

    /// Wait for a finit condition to be set
    ///
    /// # Errors
    /// - HarnessError::ConditionTimeout if the condition is still unset at the deadline
    /// - HarnessError::Channel if a query could not be run at all
    pub async fn wait_for_condition(
        &self,
        condition: &Condition,
        timeout: Duration,
    ) -> Result<WaitOutcome> {
        let span = info_span!(
            "nested",
            message = %format!("waiting for finit condition '{condition}'")
        );
        self.poll_condition(condition, timeout)
            .instrument(span)
            .await
    }

    /// Wait for `service/<service>/running`
    pub async fn wait_for_service(&self, service: &str, timeout: Duration) -> Result<WaitOutcome> {
        let condition = Condition::service(EntityName::new(service)?);
        self.wait_for_condition(&condition, timeout).await
    }

    /// Wait for `task/<task>/success`
    pub async fn wait_for_task(&self, task: &str, timeout: Duration) -> Result<WaitOutcome> {
        let condition = Condition::task(EntityName::new(task)?);
        self.wait_for_condition(&condition, timeout).await
    }

    /// Wait for `net/<interface>/up`
    pub async fn wait_for_interface(
        &self,
        interface: &str,
        timeout: Duration,
    ) -> Result<WaitOutcome> {
        let condition = Condition::net_interface(EntityName::new(interface)?);
        self.wait_for_condition(&condition, timeout).await
    }

    /// Wait for finit to announce `entering runlevel <level>` on the console
    ///
    /// # Errors
    /// - HarnessError::TextTimeout if the line does not appear before the deadline
    /// - HarnessError::Console if the console cannot be read
    pub async fn wait_for_runlevel(&self, level: Runlevel, timeout: Duration) -> Result<WaitOutcome> {
        let span = info_span!("nested", message = %format!("waiting for runlevel {level}"));
        self.wait_for_console_text(level.console_text(), timeout)
            .instrument(span)
            .await
    }

    // ------------------------------------------------------------------
    // Dispatches (pass-through: never raise on non-zero exit)
    // ------------------------------------------------------------------

    /// Run `initctl <cmd>`
    pub async fn initctl(&self, cmd: &str) -> Result<ExecutionResult> {
        self.dispatch(InitctlCommand::raw(cmd)?).await
    }

    pub async fn start_service(&self, service: &str) -> Result<ExecutionResult> {
        self.control(ControlVerb::Start, service).await
    }

    pub async fn stop_service(&self, service: &str) -> Result<ExecutionResult> {
        self.control(ControlVerb::Stop, service).await
    }

    /// Reload a service's configuration
    pub async fn reload_service(&self, service: &str) -> Result<ExecutionResult> {
        self.control(ControlVerb::Reload, service).await
    }

    pub async fn get_service_status(&self, service: &str) -> Result<ExecutionResult> {
        self.control(ControlVerb::Status, service).await
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn control(&self, verb: ControlVerb, service: &str) -> Result<ExecutionResult> {
        let service = EntityName::new(service)?;
        self.dispatch(InitctlCommand::control(verb, service)).await
    }

    async fn dispatch(&self, command: InitctlCommand) -> Result<ExecutionResult> {
        let command_line = command.command_line();
        let result = self.channel.execute(&command_line).await?;

        info!(
            command = %command_line,
            exit_code = result.exit_code(),
            "initctl dispatched"
        );

        Ok(result)
    }

    async fn poll_condition(&self, condition: &Condition, timeout: Duration) -> Result<WaitOutcome> {
        let command_line = InitctlCommand::cond_get(condition.clone()).command_line();
        let start = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let budget = timeout
                .saturating_sub(start.elapsed())
                .max(MIN_QUERY_BUDGET);

            // A query still running when its budget runs out counts as unsatisfied
            let satisfied =
                match tokio::time::timeout(budget, self.channel.execute(&command_line)).await {
                    Ok(result) => result?.succeeded(),
                    Err(_) => false,
                };

            let elapsed = start.elapsed();

            if satisfied {
                info!(
                    condition = %condition,
                    attempts = attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Condition satisfied"
                );
                return Ok(WaitOutcome { attempts, elapsed });
            }

            if elapsed >= timeout {
                warn!(
                    condition = %condition,
                    attempts = attempts,
                    timeout_ms = timeout.as_millis() as u64,
                    "Condition timeout"
                );
                return Err(HarnessError::ConditionTimeout {
                    condition: condition.clone(),
                    timeout,
                });
            }

            let delay = self.poll_policy.next_delay(attempts - 1, timeout - elapsed);
            debug!(
                condition = %condition,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                "Condition not yet satisfied"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn wait_for_console_text(&self, text: String, timeout: Duration) -> Result<WaitOutcome> {
        let start = Instant::now();

        // Guard against a watcher that overruns its own deadline
        let waited = tokio::time::timeout(timeout, self.console.wait_for_text(&text, timeout)).await;

        match waited {
            Ok(Ok(())) => {
                let elapsed = start.elapsed();
                info!(
                    text = %text,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Console text matched"
                );
                Ok(WaitOutcome {
                    attempts: 1,
                    elapsed,
                })
            }
            Ok(Err(ConsoleError::Timeout(_))) | Err(_) => {
                warn!(
                    text = %text,
                    timeout_ms = timeout.as_millis() as u64,
                    "Console text timeout"
                );
                Err(HarnessError::TextTimeout { text, timeout })
            }
            Ok(Err(e)) => Err(e.into()),
        }
    }
}
