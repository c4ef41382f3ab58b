use crate::command::Command;
use crate::error::ShellError;
use crate::interpreter::Flow;
use crate::lifecycle::Termination;
use crate::session::Session;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Where a built-in runs.
///
/// A built-in on either side of a pipeline behaves as if it ran in a process
/// of its own: it can neither end the session nor move the session's
/// working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Directly on behalf of the interactive session.
    Session,
    /// As one stage of a pipeline.
    Stage,
}

/// Built-in commands known to the shell at compile time.
///
/// Built-ins are executed directly in-process without spawning a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Echo,
    Exit,
    Help,
    History,
}

const HELP: &str = "\
mini-shell: a small interactive command interpreter.
Type a program name and arguments; join two commands with a single '|'.
Built-in commands:
\tcd -- change working directories
\techo -- print out user input after echo command
\texit -- terminate the shell
\thelp -- print out message explaining all built-in commands
\thistory -- print out user input history
";

impl Builtin {
    /// Every built-in, in lookup order.
    pub const ALL: [Builtin; 5] = [
        Builtin::Cd,
        Builtin::Echo,
        Builtin::Exit,
        Builtin::Help,
        Builtin::History,
    ];

    /// Canonical name of the command, e.g. "echo" or "cd".
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => "cd",
            Builtin::Echo => "echo",
            Builtin::Exit => "exit",
            Builtin::Help => "help",
            Builtin::History => "history",
        }
    }

    /// Find the built-in with exactly this name. Matching is case-sensitive.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    /// Run the built-in for `command`, writing its output to `out`.
    pub fn run(
        self,
        command: &Command,
        session: &Session,
        scope: Scope,
        out: &mut dyn Write,
    ) -> io::Result<Flow> {
        tracing::debug!(builtin = self.name(), ?scope, "running built-in");
        match self {
            Builtin::Cd => {
                cd(command.args().first().map(String::as_str), scope, out)?;
                Ok(Flow::Continue)
            }
            Builtin::Echo => {
                writeln!(out, "{}", command.args().join(" "))?;
                Ok(Flow::Continue)
            }
            Builtin::Exit => Ok(match scope {
                Scope::Session => Flow::Terminate(Termination::ExitCommand),
                // ends only this pipeline stage
                Scope::Stage => Flow::Continue,
            }),
            Builtin::Help => {
                out.write_all(HELP.as_bytes())?;
                Ok(Flow::Continue)
            }
            Builtin::History => {
                session.history().snapshot().write_listing(out)?;
                Ok(Flow::Continue)
            }
        }
    }
}

/// Only the first argument is consulted. Without one, nothing happens.
fn cd(target: Option<&str>, scope: Scope, out: &mut dyn Write) -> io::Result<()> {
    let Some(target) = target else {
        return Ok(());
    };
    let changed = match scope {
        Scope::Session => env::set_current_dir(target).map_err(|err| {
            tracing::debug!(dir = target, "chdir failed: {err}");
        }),
        Scope::Stage => match fs::metadata(Path::new(target)) {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(()),
        },
    };
    if changed.is_err() {
        let err = ShellError::TargetDirectoryInvalid {
            target: target.to_string(),
        };
        writeln!(out, "{err}")?;
    }
    Ok(())
}

/// Result of offering a command to the built-in dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Handled(Flow),
    NotHandled,
}

/// Run `command` if its name is a built-in; otherwise do nothing at all.
pub fn dispatch(
    command: &Command,
    session: &Session,
    scope: Scope,
    out: &mut dyn Write,
) -> io::Result<Dispatch> {
    match Builtin::lookup(command.name()) {
        Some(builtin) => builtin.run(command, session, scope, out).map(Dispatch::Handled),
        None => Ok(Dispatch::NotHandled),
    }
}
