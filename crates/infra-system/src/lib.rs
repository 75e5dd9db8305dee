// finit-harness Infrastructure - System Adapters
// Implements: ExecutionChannel, ConsoleWatcher

pub mod log_file_console;
pub mod shell_channel;

pub use log_file_console::{LogFileConsole, StartPosition};
pub use shell_channel::ShellChannel;
