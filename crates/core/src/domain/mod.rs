// Domain Layer - Condition grammar and command translation (no I/O)

pub mod command;
pub mod condition;
pub mod error;
pub mod legacy;
pub mod name;
pub mod runlevel;

// Re-exports
pub use command::{ControlVerb, InitctlCommand, INITCTL};
pub use condition::{Condition, CustomCondition};
pub use error::DomainError;
pub use legacy::LegacyOperation;
pub use name::EntityName;
pub use runlevel::Runlevel;
