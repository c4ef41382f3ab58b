use std::process::ExitStatus;

/// A single command: the program or built-in name followed by its arguments.
///
/// A `Command` always holds at least one token; blank input never gets this far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    argv: Vec<String>,
}

impl Command {
    /// Build a command from its tokens. Returns `None` when `argv` is empty.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            None
        } else {
            Some(Self { argv })
        }
    }

    /// The first token: the name of the built-in or program to run.
    pub fn name(&self) -> &str {
        &self.argv[0]
    }

    /// Every token after the name.
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

/// Two commands joined by a single pipe.
///
/// Everything `left` writes to its standard output becomes `right`'s standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    pub left: Command,
    pub right: Command,
}

/// How a command (or a pipeline stage) ended, as far as the interpreter cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    /// The executable could not be located or invoked.
    NotFound,
    OtherFailure,
}

impl ExitOutcome {
    /// Classify the termination status of a child that was launched successfully.
    ///
    /// A program that ran and failed is never `NotFound`, whatever its exit code.
    pub fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            ExitOutcome::Success
        } else {
            ExitOutcome::OtherFailure
        }
    }
}
