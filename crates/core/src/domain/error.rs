// Domain Error Types

use thiserror::Error;

/// Validation failures raised while translating test intents.
///
/// Nothing here touches the target: every variant is detected before a
/// command string is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid {kind} name '{value}': {reason}")]
    InvalidName {
        kind: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid runlevel '{0}': expected 0-9 or S")]
    InvalidRunlevel(String),

    #[error("Invalid condition '{value}': {reason}")]
    InvalidCondition { value: String, reason: String },

    #[error("Invalid initctl command: {0}")]
    InvalidCommand(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
