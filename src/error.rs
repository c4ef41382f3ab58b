//! Error taxonomy of the interpreter.
//!
//! The `Display` text of each variant is the exact single-line diagnostic shown
//! to the user.

use std::io;

use thiserror::Error;

/// Diagnostic printed whenever a command (or a pipeline stage) cannot be launched.
pub const NOT_FOUND_MESSAGE: &str = "Command not found--Did you mean something else?";

#[derive(Debug, Error)]
pub enum ShellError {
    /// The OS refused to create a process or a pipe. Fatal for the whole session.
    #[error("fork failed for some reason!")]
    ResourceExhaustion(#[source] io::Error),

    #[error("Command not found--Did you mean something else?")]
    CommandNotFound { name: String },

    #[error("cd: {target}: No such file or directory!")]
    TargetDirectoryInvalid { target: String },

    #[error(transparent)]
    MalformedLine(#[from] LineError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Whether the session can keep reading lines after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ShellError::ResourceExhaustion(_) | ShellError::Io(_))
    }
}

/// Problems with the shape of an input line. Nothing from such a line is executed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error(transparent)]
    Lexing(#[from] LexingError),
    #[error(transparent)]
    Parsing(#[from] ParsingError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexingError {
    #[error("mini-shell: input line too long (max {limit} bytes)")]
    LineTooLong { limit: usize },
    #[error("mini-shell: too many arguments (max {limit})")]
    TooManyArguments { limit: usize },
    /// The raw bytes read from the terminal do not decode as text.
    #[error("mini-shell: input is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsingError {
    /// One side of the `|` has no command on it.
    #[error("mini-shell: syntax error near unexpected token '|'")]
    EmptyPipelineSide,
    #[error("mini-shell: only one '|' is supported per line")]
    MultiplePipes,
}
