//! Session-lifetime log of every line the user entered.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Append-only, insertion-ordered store of raw input lines.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: Vec<String>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and give the memory back.
    pub fn clear_and_release(&mut self) {
        self.entries = Vec::new();
    }

    /// Print every entry, 1-indexed, with the ordinal right-aligned in a fixed field.
    ///
    /// Entries are printed verbatim; a line terminator is added only when the
    /// stored text lacks one. An empty store prints nothing.
    pub fn write_listing(&self, out: &mut dyn Write) -> io::Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            write!(out, "{:4}    {}", i + 1, entry)?;
            if !entry.ends_with('\n') {
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

/// Shared handle to the session's [`HistoryStore`].
///
/// The read loop is the only writer; the lifecycle watcher only tears it down.
#[derive(Debug, Clone, Default)]
pub struct HistoryHandle {
    inner: Arc<Mutex<HistoryStore>>,
}

impl HistoryHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, HistoryStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, line: impl Into<String>) {
        self.lock().append(line);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear_and_release(&self) {
        self.lock().clear_and_release();
    }

    /// Copy of the current contents, so that printing never holds the lock.
    pub fn snapshot(&self) -> HistoryStore {
        self.lock().clone()
    }
}
