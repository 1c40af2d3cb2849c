//! Builtin-boundary errors.
//!
//! Each variant's `Display` is exactly the text shown in the scrollback.

use cyberlab_types::error::CyberlabError;

/// Error returned by a builtin.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Missing or malformed arguments. Holds the usage synopsis.
    #[error("Usage: {0}")]
    Usage(String),

    /// The named file matches no declared artifact.
    #[error("{command}: file not found")]
    NotFound { command: String },

    /// The artifact could not be fetched or read.
    #[error("{command}: unable to read file")]
    ReadFailed { command: String },

    /// The input could not be decoded.
    #[error("{command}: invalid input")]
    InvalidInput { command: String },

    /// The search pattern is not a valid regular expression.
    #[error("{command}: invalid pattern")]
    InvalidPattern { command: String },

    /// Deliberately unsupported operation (MD5, unsupported pipe target).
    #[error("{0}")]
    Unsupported(String),

    /// Network command failed; holds the full message.
    #[error("{0}")]
    Network(String),

    #[error("Command not found: {0}")]
    UnknownCommand(String),
}

impl CommandError {
    /// Map a file store failure, keeping "not found" distinct.
    pub fn from_store(command: &str, err: &CyberlabError) -> Self {
        match err {
            CyberlabError::NotFound(_) => Self::NotFound {
                command: command.to_string(),
            },
            _ => Self::ReadFailed {
                command: command.to_string(),
            },
        }
    }

    /// Map any file store failure to "unable to read file".
    pub fn read_failed(command: &str) -> Self {
        Self::ReadFailed {
            command: command.to_string(),
        }
    }
}
