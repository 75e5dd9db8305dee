// finit-harness Core - Condition grammar, ports & polling
// NO process or file access (Hexagonal Architecture)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{FinitMachine, PollPolicy, Step, StepOutcome, WaitOutcome};
pub use error::{HarnessError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
