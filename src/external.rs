use crate::command::{Command, ExitOutcome};
use crate::error::ShellError;
use std::io::{self, Write};
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Stdio};

/// Outcome of trying to start an external program.
pub(crate) enum Launch {
    Started(Child),
    /// The program could not be located or invoked.
    NotFound(io::Error),
}

/// Start `command` as a child process with the given standard streams.
///
/// Program lookup is left to the OS search path. Failing to start because the
/// program is missing or not executable yields [`Launch::NotFound`]; failing
/// because the OS is out of processes, memory or descriptors is fatal.
pub(crate) fn spawn(command: &Command, stdin: Stdio, stdout: Stdio) -> Result<Launch, ShellError> {
    let spawned = std::process::Command::new(command.name())
        .args(command.args())
        .stdin(stdin)
        .stdout(stdout)
        .spawn();
    match spawned {
        Ok(child) => {
            tracing::debug!(program = command.name(), pid = child.id(), "spawned");
            Ok(Launch::Started(child))
        }
        Err(err) if is_resource_exhaustion(&err) => Err(ShellError::ResourceExhaustion(err)),
        Err(err) => {
            tracing::debug!(program = command.name(), "cannot launch: {err}");
            Ok(Launch::NotFound(err))
        }
    }
}

fn is_resource_exhaustion(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error(),
        Some(libc::EAGAIN | libc::ENOMEM | libc::EMFILE | libc::ENFILE)
    )
}

/// Wait for `child` to terminate and classify how it ended.
pub(crate) fn reap(mut child: Child) -> ExitOutcome {
    let pid = child.id();
    match child.wait() {
        Ok(status) => {
            tracing::debug!(pid, code = ?status.code(), signal = ?status.signal(), "reaped");
            ExitOutcome::from_status(status)
        }
        Err(err) => {
            tracing::warn!(pid, "waiting for child failed: {err}");
            ExitOutcome::OtherFailure
        }
    }
}

pub(crate) fn report_not_found(command: &Command, out: &mut dyn Write) -> io::Result<()> {
    let err = ShellError::CommandNotFound {
        name: command.name().to_string(),
    };
    writeln!(out, "{err}")?;
    out.flush()
}

/// Run a command that is not a built-in: one child, waited for before returning.
///
/// The child shares the interpreter's standard streams. When it cannot be
/// launched, a single not-found diagnostic is written to `out`.
pub fn run_external(command: &Command, out: &mut dyn Write) -> Result<ExitOutcome, ShellError> {
    // anything buffered must reach the terminal before the child writes
    out.flush()?;
    match spawn(command, Stdio::inherit(), Stdio::inherit())? {
        Launch::Started(child) => Ok(reap(child)),
        Launch::NotFound(_) => {
            report_not_found(command, out)?;
            Ok(ExitOutcome::NotFound)
        }
    }
}
