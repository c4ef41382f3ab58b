use crate::builtin::{self, Dispatch, Scope};
use crate::config::Config;
use crate::error::{LexingError, LineError, ShellError};
use crate::external;
use crate::lifecycle::Termination;
use crate::parser::{self, ParsedLine};
use crate::pipeline;
use crate::session::Session;
use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, IsTerminal, Write};
use std::thread;

/// What the read loop does after a line has been executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Terminate(Termination),
}

/// The interactive command interpreter.
///
/// Owns the [`Session`] and executes one line at a time: the line is recorded
/// in history, parsed, and then run as a built-in, an external program or a
/// two-stage pipeline.
///
/// Example
/// ```
/// use mini_shell::{Flow, Interpreter};
/// use mini_shell::config::Config;
///
/// let mut sh = Interpreter::new(Config::default());
/// let mut out = Vec::new();
/// let flow = sh.execute_line_with_output("echo hello world\n", &mut out).unwrap();
/// assert_eq!(flow, Flow::Continue);
/// assert_eq!(out, b"hello world\n");
/// ```
pub struct Interpreter {
    session: Session,
    config: Config,
}

impl Interpreter {
    pub fn new(config: Config) -> Self {
        Self {
            session: Session::new(),
            config,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute one raw line, writing diagnostics and built-in output to standard output.
    pub fn execute_line(&mut self, line: &str) -> Result<Flow, ShellError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.execute_line_with_output(line, &mut out)
    }

    /// Execute one raw line, writing diagnostics and built-in output to `out`.
    ///
    /// External programs always write to the inherited standard output.
    /// Recoverable problems are reported on `out` and yield [`Flow::Continue`];
    /// only fatal ones come back as errors.
    pub fn execute_line_with_output(
        &mut self,
        line: &str,
        out: &mut dyn Write,
    ) -> Result<Flow, ShellError> {
        self.session.record(line);

        let parsed = match parser::parse_line(line, self.config.limits) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!(?err, "rejecting line");
                writeln!(out, "{}", ShellError::from(err))?;
                out.flush()?;
                return Ok(Flow::Continue);
            }
        };

        let flow = match parsed {
            ParsedLine::Blank => Flow::Continue,
            ParsedLine::Simple(command) => {
                match builtin::dispatch(&command, &self.session, Scope::Session, out)? {
                    Dispatch::Handled(flow) => flow,
                    Dispatch::NotHandled => {
                        let outcome = external::run_external(&command, out)?;
                        tracing::debug!(program = command.name(), ?outcome, "command finished");
                        Flow::Continue
                    }
                }
            }
            ParsedLine::Pipeline(spec) => {
                let report = pipeline::run_pipeline(&spec, &self.session, out)?;
                tracing::debug!(
                    left = spec.left.name(),
                    right = spec.right.name(),
                    ?report,
                    "pipeline finished"
                );
                Flow::Continue
            }
        };
        out.flush()?;
        Ok(flow)
    }

    /// Read and execute lines until the session ends.
    ///
    /// Returns why the session ended, after history has been released. If an
    /// asynchronous trigger (interrupt or idle timeout) got there first, this
    /// never returns: that trigger owns the teardown and ends the process.
    ///
    /// Recoverable errors are printed and the loop goes on; anything else ends
    /// the session with an error.
    pub fn repl(&mut self) -> anyhow::Result<Termination> {
        let mut rl = DefaultEditor::new().context("cannot set up line editor")?;
        // the editor stays silent when standard input is not a terminal
        let interactive = io::stdin().is_terminal();

        let termination = loop {
            let prompt = if interactive {
                self.config.prompt.as_str()
            } else {
                print_prompt(&self.config.prompt)?;
                ""
            };
            let line = match rl.readline(prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => break Termination::Interrupt,
                Err(ReadlineError::Eof) => break Termination::EndOfInput,
                Err(err) => match unreadable_line(&err) {
                    Some(line_err) => {
                        report(&line_err)?;
                        continue;
                    }
                    None => return Err(err).context("cannot read input line"),
                },
            };
            if let Err(err) = rl.add_history_entry(line.as_str()) {
                tracing::debug!("editor history: {err}");
            }
            // the editor strips the terminator; history keeps the raw line
            match self.execute_line(&format!("{line}\n")) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Terminate(termination)) => break termination,
                Err(err) if err.is_recoverable() => report(&err)?,
                Err(err) => return Err(err.into()),
            }
        };
        Ok(self.finish(termination))
    }

    fn finish(&self, termination: Termination) -> Termination {
        if !self.session.end(termination) {
            tracing::debug!(?termination, "session already ending");
            loop {
                thread::park();
            }
        }
        termination
    }
}

/// A read failure that only spoils the current line.
///
/// Bytes that are not UTF-8 have already been consumed by the editor, so the
/// next read starts on a fresh line.
fn unreadable_line(err: &ReadlineError) -> Option<ShellError> {
    match err {
        ReadlineError::Io(io_err) if io_err.kind() == io::ErrorKind::InvalidData => {
            Some(LineError::from(LexingError::InvalidUtf8).into())
        }
        _ => None,
    }
}

fn report(err: &ShellError) -> io::Result<()> {
    tracing::debug!(?err, "recoverable error");
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{err}")?;
    stdout.flush()
}

fn print_prompt(prompt: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(prompt.as_bytes())?;
    stdout.flush()
}
