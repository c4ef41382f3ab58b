use crate::history::HistoryHandle;
use crate::lifecycle::{Lifecycle, LifecycleState, Termination};

/// Process-wide state of one interactive session.
///
/// Owns the history and the lifecycle state. It is created before the first
/// line is read and torn down exactly once, by whichever termination trigger
/// fires first.
#[derive(Debug, Default)]
pub struct Session {
    history: HistoryHandle,
    lifecycle: Lifecycle,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &HistoryHandle {
        &self.history
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Record a raw input line. Called for every line, blank ones included.
    pub fn record(&self, line: &str) {
        self.history.append(line);
    }

    /// Move to `Terminating` and release the history.
    ///
    /// Returns `false` if another trigger already ended the session; the
    /// history is then left to that trigger.
    pub fn end(&self, termination: Termination) -> bool {
        if !self.lifecycle.begin_termination(termination) {
            return false;
        }
        tracing::debug!(?termination, entries = self.history.len(), "ending session");
        self.history.clear_and_release();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_every_line_including_blank_ones() {
        let session = Session::new();
        session.record("echo a\n");
        session.record("  \n");
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn ending_releases_history_once() {
        let session = Session::new();
        session.record("ls\n");
        assert!(session.end(Termination::ExitCommand));
        assert!(session.history().is_empty());
        assert_eq!(
            session.state(),
            LifecycleState::Terminating(Termination::ExitCommand)
        );

        assert!(!session.end(Termination::Interrupt));
        assert_eq!(
            session.state(),
            LifecycleState::Terminating(Termination::ExitCommand)
        );
    }
}
