// Port Layer - Interfaces for external collaborators (target channel, console)

pub mod console;
pub mod execution_channel;

// Re-exports
pub use console::{ConsoleError, ConsoleWatcher};
pub use execution_channel::{ChannelError, ExecutionChannel, ExecutionResult};
