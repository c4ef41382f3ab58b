//! Session lifecycle: the `Running -> Terminating` state machine and the
//! controller that reacts to interrupts and the idle-timeout alarm.
//!
//! Signals are never acted upon inside a handler. The handlers forward them to
//! a watcher thread, which tears the session down from ordinary code and ends
//! the process.

use std::io;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;
use std::time::Duration;

use crate::history::HistoryHandle;
use crate::session::Session;
use crate::signal::{self, SIGALRM, SIGINT, SignalHandler, SignalStream};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The `exit` built-in at the top level.
    ExitCommand,
    /// Standard input reached end of file.
    EndOfInput,
    /// Ctrl-C at the prompt, or SIGINT at any time.
    Interrupt,
    /// The idle-timeout alarm went off.
    IdleTimeout,
}

impl Termination {
    /// Message written to the terminal on the way out, if any.
    pub fn farewell(self) -> Option<&'static str> {
        match self {
            Termination::Interrupt => Some("mini-shell terminated!\n"),
            Termination::IdleTimeout => Some("mini-shell timed out!\n"),
            Termination::ExitCommand | Termination::EndOfInput => None,
        }
    }

    fn encode(self) -> u8 {
        match self {
            Termination::ExitCommand => 1,
            Termination::EndOfInput => 2,
            Termination::Interrupt => 3,
            Termination::IdleTimeout => 4,
        }
    }

    fn decode(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Termination::ExitCommand),
            2 => Some(Termination::EndOfInput),
            3 => Some(Termination::Interrupt),
            4 => Some(Termination::IdleTimeout),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    Terminating(Termination),
}

const RUNNING: u8 = 0;

/// Shared lifecycle state. The first trigger to call
/// [`begin_termination`](Lifecycle::begin_termination) wins.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: Arc<AtomicU8>,
}

impl Lifecycle {
    pub fn state(&self) -> LifecycleState {
        match Termination::decode(self.state.load(Ordering::Acquire)) {
            Some(termination) => LifecycleState::Terminating(termination),
            None => LifecycleState::Running,
        }
    }

    /// Attempt the `Running -> Terminating` transition.
    pub fn begin_termination(&self, termination: Termination) -> bool {
        self.state
            .compare_exchange(
                RUNNING,
                termination.encode(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

fn termination_for(signal: signal::SignalNumber) -> Option<Termination> {
    match signal {
        SIGINT => Some(Termination::Interrupt),
        SIGALRM => Some(Termination::IdleTimeout),
        _ => None,
    }
}

/// Installed interrupt and idle-timeout handling for one session.
///
/// Dropping the controller restores the previous signal actions and cancels
/// the alarm.
pub struct Controller {
    _handlers: [SignalHandler; 2],
    alarm_armed: bool,
}

impl Controller {
    /// Install handlers, start the watcher thread and arm the idle timeout.
    ///
    /// `idle_timeout` is measured from now; `None` disables it. Sub-second
    /// precision is dropped and a non-zero timeout is at least one second.
    pub fn install(session: &Session, idle_timeout: Option<Duration>) -> io::Result<Self> {
        signal::save_terminal()?;
        let stream = SignalStream::new()?;
        let handlers = [
            SignalHandler::register(SIGINT)?,
            SignalHandler::register(SIGALRM)?,
        ];

        let history = session.history().clone();
        let lifecycle = session.lifecycle().clone();
        thread::Builder::new()
            .name("lifecycle".into())
            .spawn(move || watch(stream, history, lifecycle))?;

        let alarm_armed = match idle_timeout {
            Some(timeout) if !timeout.is_zero() => {
                let seconds = u32::try_from(timeout.as_secs()).unwrap_or(u32::MAX).max(1);
                tracing::debug!(seconds, "arming idle timeout");
                signal::arm_alarm(seconds);
                true
            }
            _ => false,
        };

        Ok(Self {
            _handlers: handlers,
            alarm_armed,
        })
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if self.alarm_armed {
            signal::arm_alarm(0);
        }
    }
}

fn watch(mut stream: SignalStream, history: HistoryHandle, lifecycle: Lifecycle) {
    loop {
        let signal = match stream.recv() {
            Ok(signal) => signal,
            Err(err) => {
                tracing::warn!("signal stream failed, interrupts are no longer handled: {err}");
                return;
            }
        };
        match termination_for(signal) {
            Some(termination) => terminate(termination, &history, &lifecycle),
            None => tracing::debug!(signal, "ignoring unexpected signal"),
        }
    }
}

fn terminate(termination: Termination, history: &HistoryHandle, lifecycle: &Lifecycle) {
    if !lifecycle.begin_termination(termination) {
        // the read loop is already ending the session
        return;
    }
    signal::restore_terminal();
    if let Some(message) = termination.farewell() {
        signal::write_unbuffered(message);
    }
    history.clear_and_release();
    process::exit(0);
}
