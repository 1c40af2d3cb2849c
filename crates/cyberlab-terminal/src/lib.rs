//! Challenge terminal.
//!
//! The terminal is a registry-based dispatch system. Builtins implement the
//! `Command` trait and are registered by name. The interpreter trims and
//! tokenizes a line, resolves the command name case-insensitively, and
//! dispatches `execute()`. Failures never escape: every `CommandError` is
//! rendered into the scrollback as text.
//!
//! The only composition supported is a single pipe into `grep`:
//! `<cmd> [args] | grep <pattern>`. Anything else after `|` is rejected with
//! `pipe: unsupported combination`. This is not a shell.

mod commands;
mod digest_commands;
mod encode_commands;
mod error;
mod interpreter;
mod network_commands;
mod session;
mod text_commands;

#[cfg(test)]
pub(crate) mod test_utils;

/// Register every builtin into a registry.
pub use commands::register_builtins;
/// Error raised by a builtin, rendered as its user-facing text.
pub use error::CommandError;
/// A single executable command trait.
pub use interpreter::Command;
/// Output produced by a command.
pub use interpreter::CommandOutput;
/// Registry of available commands with dispatch.
pub use interpreter::CommandRegistry;
/// Borrowed context passed to every command.
pub use interpreter::Environment;
/// Interactive session: scrollback, recall, and completion.
pub use session::{ScrollbackEntry, TerminalSession};
