//! Two commands joined by a single anonymous pipe.
//!
//! Each stage is offered to the built-in dispatcher first and launched as an
//! external program otherwise. Built-in stages run in-process in
//! [`Scope::Stage`]; external stages are child processes wired to the pipe.
//! Both children are reaped before returning.

use std::io::{self, PipeWriter, Write};
use std::process::{Child, Stdio};

use crate::builtin::{Builtin, Scope};
use crate::command::{Command, ExitOutcome, PipelineSpec};
use crate::error::ShellError;
use crate::external::{self, Launch};
use crate::interpreter::Flow;
use crate::session::Session;

/// How each stage of a pipeline ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    pub left: ExitOutcome,
    pub right: ExitOutcome,
}

/// An external stage that was asked to start.
enum Stage {
    Running(Child),
    Missing,
}

impl Stage {
    fn launch(
        command: &Command,
        stdin: Stdio,
        stdout: Stdio,
        out: &mut dyn Write,
    ) -> Result<Self, ShellError> {
        match external::spawn(command, stdin, stdout)? {
            Launch::Started(child) => Ok(Stage::Running(child)),
            Launch::NotFound(_) => {
                external::report_not_found(command, out)?;
                Ok(Stage::Missing)
            }
        }
    }

    fn is_running(&self) -> bool {
        matches!(self, Stage::Running(_))
    }

    fn reap(self) -> ExitOutcome {
        match self {
            Stage::Running(child) => external::reap(child),
            Stage::Missing => ExitOutcome::NotFound,
        }
    }

    /// Used when the pipeline cannot be completed: do not leave a zombie behind.
    fn abandon(self) {
        if let Stage::Running(mut child) = self {
            if let Err(err) = child.kill() {
                tracing::debug!(pid = child.id(), "kill failed: {err}");
            }
            external::reap(child);
        }
    }
}

/// Run `left | right`.
///
/// Everything the left stage writes reaches the right stage in order; the
/// right stage sees end of input once the left one is done. When the right
/// stage is a built-in nothing reads the pipe, so the left stage's output is
/// discarded. A stage that cannot be launched is reported once, and a missing
/// left stage leaves the right one with empty input.
///
/// Failing to create the pipe or a process is fatal.
pub fn run_pipeline(
    spec: &PipelineSpec,
    session: &Session,
    out: &mut dyn Write,
) -> Result<PipelineReport, ShellError> {
    out.flush()?;
    let left_builtin = Builtin::lookup(spec.left.name());
    let right_builtin = Builtin::lookup(spec.right.name());

    let (reader, writer) = match right_builtin {
        Some(_) => (None, None),
        None => {
            let (reader, writer) = io::pipe().map_err(ShellError::ResourceExhaustion)?;
            (Some(reader), Some(writer))
        }
    };

    let (left, writer) = match left_builtin {
        Some(_) => (None, writer),
        None => {
            let stdout = writer.map_or_else(Stdio::null, Stdio::from);
            let stage = Stage::launch(&spec.left, Stdio::inherit(), stdout, out)?;
            (Some(stage), None)
        }
    };

    let right = match right_builtin {
        Some(_) => None,
        None => {
            let stdin = reader.map_or_else(Stdio::null, Stdio::from);
            match Stage::launch(&spec.right, stdin, Stdio::inherit(), out) {
                Ok(stage) => Some(stage),
                Err(err) => {
                    if let Some(left) = left {
                        left.abandon();
                    }
                    return Err(err);
                }
            }
        }
    };

    if let Some(builtin) = left_builtin {
        let feeds_reader = right.as_ref().is_some_and(Stage::is_running);
        run_left_builtin(builtin, &spec.left, session, writer.filter(|_| feeds_reader))?;
    }
    if let Some(builtin) = right_builtin {
        stage_finished(builtin.run(&spec.right, session, Scope::Stage, out))?;
        out.flush()?;
    }

    Ok(PipelineReport {
        left: left.map_or(ExitOutcome::Success, Stage::reap),
        right: right.map_or(ExitOutcome::Success, Stage::reap),
    })
}

/// The write end is dropped on return, which is what lets the reader finish.
fn run_left_builtin(
    builtin: Builtin,
    command: &Command,
    session: &Session,
    pipe: Option<PipeWriter>,
) -> io::Result<()> {
    match pipe {
        Some(mut pipe) => stage_finished(builtin.run(command, session, Scope::Stage, &mut pipe)),
        None => stage_finished(builtin.run(command, session, Scope::Stage, &mut io::sink())),
    }
}

/// A reader that went away early ends the stage, not the session.
fn stage_finished(result: io::Result<Flow>) -> io::Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            tracing::debug!("pipeline reader closed early");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
