// Application Layer - Polling, dispatch and scenario execution

pub mod constants;
pub mod machine;
pub mod poll;
pub mod scenario;

// Re-exports
pub use machine::{FinitMachine, WaitOutcome};
pub use poll::PollPolicy;
pub use scenario::{Step, StepOutcome};
