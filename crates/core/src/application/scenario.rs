//! Scenario steps
//!
//! A scenario is a JSON array of steps tagged by `op`, run in order against a
//! `FinitMachine`:
//!
//! ```json
//! [
//!   { "op": "wait_for_runlevel", "level": 2, "timeout_secs": 60 },
//!   { "op": "wait_for_service", "service": "nginx" },
//!   { "op": "reload_service", "service": "nginx" },
//!   { "op": "initctl", "cmd": "cond dump" }
//! ]
//! ```
//!
//! The first failing step stops the run. Steps named after systemd-driver
//! operations parse, but running them raises `UnsupportedProtocol` without
//! touching the target.

use super::machine::{FinitMachine, WaitOutcome};
use crate::domain::{Condition, DomainError, LegacyOperation, Runlevel};
use crate::error::{HarnessError, Result};
use crate::port::ExecutionResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

/// Runlevel as written in a scenario: `2` or `"S"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelInput {
    Number(i64),
    Text(String),
}

impl LevelInput {
    fn to_runlevel(&self) -> Result<Runlevel> {
        let level = match self {
            LevelInput::Number(n) => {
                let n = u8::try_from(*n)
                    .map_err(|_| DomainError::InvalidRunlevel(n.to_string()))?;
                Runlevel::try_from(n)?
            }
            LevelInput::Text(s) => s.parse()?,
        };
        Ok(level)
    }
}

/// One scenario step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    WaitForCondition {
        condition: String,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    WaitForRunlevel {
        level: LevelInput,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    WaitForService {
        service: String,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    WaitForTask {
        task: String,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    WaitForInterface {
        interface: String,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    StartService {
        service: String,
    },
    StopService {
        service: String,
    },
    ReloadService {
        service: String,
    },
    GetServiceStatus {
        service: String,
    },
    Initctl {
        cmd: String,
    },

    // systemd driver operations, rejected at run time
    WaitForUnit {
        #[serde(default)]
        unit: Option<String>,
    },
    Systemctl {
        #[serde(default)]
        q: Option<String>,
    },
    GetUnitInfo {
        #[serde(default)]
        unit: Option<String>,
    },
}

impl Step {
    /// Parse a JSON array of steps
    pub fn parse_list(json: &str) -> Result<Vec<Step>> {
        Ok(serde_json::from_str(json)?)
    }

    /// Systemd-driver operation this step names, if any
    pub fn legacy(&self) -> Option<LegacyOperation> {
        match self {
            Step::WaitForUnit { .. } => Some(LegacyOperation::WaitForUnit),
            Step::Systemctl { .. } => Some(LegacyOperation::Systemctl),
            Step::GetUnitInfo { .. } => Some(LegacyOperation::GetUnitInfo),
            _ => None,
        }
    }

    /// Operation name as written in the scenario
    pub fn op(&self) -> &'static str {
        match self {
            Step::WaitForCondition { .. } => "wait_for_condition",
            Step::WaitForRunlevel { .. } => "wait_for_runlevel",
            Step::WaitForService { .. } => "wait_for_service",
            Step::WaitForTask { .. } => "wait_for_task",
            Step::WaitForInterface { .. } => "wait_for_interface",
            Step::StartService { .. } => "start_service",
            Step::StopService { .. } => "stop_service",
            Step::ReloadService { .. } => "reload_service",
            Step::GetServiceStatus { .. } => "get_service_status",
            Step::Initctl { .. } => "initctl",
            Step::WaitForUnit { .. } => "wait_for_unit",
            Step::Systemctl { .. } => "systemctl",
            Step::GetUnitInfo { .. } => "get_unit_info",
        }
    }
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Waited(WaitOutcome),
    Executed(ExecutionResult),
}

impl FinitMachine {
    /// Run a single step
    pub async fn run_step(&self, step: &Step) -> Result<StepOutcome> {
        let timeout = |secs: &Option<u64>| {
            secs.map(Duration::from_secs)
                .unwrap_or_else(|| self.default_timeout())
        };

        let outcome = match step {
            Step::WaitForCondition {
                condition,
                timeout_secs,
            } => {
                let condition: Condition = condition.parse()?;
                StepOutcome::Waited(
                    self.wait_for_condition(&condition, timeout(timeout_secs))
                        .await?,
                )
            }
            Step::WaitForRunlevel {
                level,
                timeout_secs,
            } => StepOutcome::Waited(
                self.wait_for_runlevel(level.to_runlevel()?, timeout(timeout_secs))
                    .await?,
            ),
            Step::WaitForService {
                service,
                timeout_secs,
            } => StepOutcome::Waited(self.wait_for_service(service, timeout(timeout_secs)).await?),
            Step::WaitForTask { task, timeout_secs } => {
                StepOutcome::Waited(self.wait_for_task(task, timeout(timeout_secs)).await?)
            }
            Step::WaitForInterface {
                interface,
                timeout_secs,
            } => StepOutcome::Waited(
                self.wait_for_interface(interface, timeout(timeout_secs))
                    .await?,
            ),
            Step::StartService { service } => StepOutcome::Executed(self.start_service(service).await?),
            Step::StopService { service } => StepOutcome::Executed(self.stop_service(service).await?),
            Step::ReloadService { service } => {
                StepOutcome::Executed(self.reload_service(service).await?)
            }
            Step::GetServiceStatus { service } => {
                StepOutcome::Executed(self.get_service_status(service).await?)
            }
            Step::Initctl { cmd } => StepOutcome::Executed(self.initctl(cmd).await?),
            Step::WaitForUnit { .. } => {
                return Err(HarnessError::unsupported(LegacyOperation::WaitForUnit))
            }
            Step::Systemctl { .. } => {
                return Err(HarnessError::unsupported(LegacyOperation::Systemctl))
            }
            Step::GetUnitInfo { .. } => {
                return Err(HarnessError::unsupported(LegacyOperation::GetUnitInfo))
            }
        };

        Ok(outcome)
    }

    /// Run steps in order, stopping at the first failure
    pub async fn run_scenario(&self, steps: &[Step]) -> Result<Vec<StepOutcome>> {
        let mut outcomes = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            match self.run_step(step).await {
                Ok(outcome) => {
                    info!(step = index, op = step.op(), "Scenario step completed");
                    outcomes.push(outcome);
                }
                Err(e) => {
                    error!(step = index, op = step.op(), error = %e, "Scenario step failed");
                    return Err(e);
                }
            }
        }

        Ok(outcomes)
    }
}
