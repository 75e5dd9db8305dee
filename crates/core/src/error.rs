// Central Error Type for the harness

use crate::domain::{Condition, DomainError, LegacyOperation};
use crate::port::{ChannelError, ConsoleError};
use std::time::Duration;
use thiserror::Error;

/// Harness-level error type.
///
/// Every wait failure is terminal for its call; nothing here is retried.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),

    #[error("Timed out after {timeout:?} waiting for finit condition '{condition}'")]
    ConditionTimeout {
        condition: Condition,
        timeout: Duration,
    },

    #[error("Timed out after {timeout:?} waiting for console text '{text}'")]
    TextTimeout { text: String, timeout: Duration },

    #[error("{operation}() is systemd-specific. Use {replacement} instead")]
    UnsupportedProtocol {
        operation: LegacyOperation,
        replacement: &'static str,
    },

    #[error("Execution channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Console error: {0}")]
    Console(#[from] ConsoleError),

    #[error("Scenario error: {0}")]
    Scenario(#[from] serde_json::Error),
}

impl HarnessError {
    pub fn unsupported(operation: LegacyOperation) -> Self {
        HarnessError::UnsupportedProtocol {
            operation,
            replacement: operation.replacement(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            HarnessError::ConditionTimeout { .. } | HarnessError::TextTimeout { .. }
        )
    }
}

/// Result type alias using HarnessError
pub type Result<T> = std::result::Result<T, HarnessError>;
