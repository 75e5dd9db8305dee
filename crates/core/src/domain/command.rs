// initctl command lines

use super::condition::Condition;
use super::error::{DomainError, Result};
use super::name::EntityName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// finit's control program inside the target
pub const INITCTL: &str = "initctl";

/// Service lifecycle verbs passed to `initctl`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlVerb {
    Start,
    Stop,
    Reload,
    Status,
}

impl ControlVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlVerb::Start => "start",
            ControlVerb::Stop => "stop",
            ControlVerb::Reload => "reload",
            ControlVerb::Status => "status",
        }
    }
}

impl fmt::Display for ControlVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `initctl` invocation, serialized to a single command line by `Display`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitctlCommand {
    /// `initctl <verb> <service>`
    Control {
        verb: ControlVerb,
        service: EntityName,
    },
    /// `initctl cond get <condition>`, exit 0 means the condition is set
    CondGet(Condition),
    /// `initctl <args>` passed through unchanged
    Raw(String),
}

impl InitctlCommand {
    pub fn control(verb: ControlVerb, service: EntityName) -> Self {
        InitctlCommand::Control { verb, service }
    }

    pub fn cond_get(condition: Condition) -> Self {
        InitctlCommand::CondGet(condition)
    }

    /// Escape hatch for arbitrary subcommands.
    ///
    /// The arguments are trusted caller input and are not sanitized; only an
    /// empty or multi-line argument string is rejected.
    pub fn raw(args: impl Into<String>) -> Result<Self> {
        let args = args.into();
        let trimmed = args.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidCommand(
                "subcommand must not be empty".to_string(),
            ));
        }
        if trimmed.contains(['\n', '\r']) {
            return Err(DomainError::InvalidCommand(
                "subcommand must be a single line".to_string(),
            ));
        }
        Ok(InitctlCommand::Raw(trimmed.to_string()))
    }

    /// Full command line as submitted to the execution channel
    pub fn command_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for InitctlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitctlCommand::Control { verb, service } => write!(f, "{INITCTL} {verb} {service}"),
            InitctlCommand::CondGet(condition) => write!(f, "{INITCTL} cond get {condition}"),
            InitctlCommand::Raw(args) => write!(f, "{INITCTL} {args}"),
        }
    }
}
