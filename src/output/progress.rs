//! Line-oriented progress reporting
//!
//! A sync round narrates what it does one human-readable line at a time.
//! Callers decide where those lines go: the tracing subscriber, a buffer, or
//! a stream such as a chunked HTTP response.

use std::io::Write;
use std::sync::Mutex;

/// Receiver for progress lines emitted during a sync
pub trait ProgressLog: Send + Sync {
    /// Records one line of progress
    fn line(&self, message: &str);
}

/// Forwards progress lines to `tracing` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressLog for TracingProgress {
    fn line(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

/// Collects progress lines in memory
#[derive(Debug, Default)]
pub struct MemoryProgress {
    lines: Mutex<Vec<String>>,
}

impl MemoryProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every line recorded so far
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Checks whether any recorded line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl ProgressLog for MemoryProgress {
    fn line(&self, message: &str) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push(message.to_string());
    }
}

/// Writes each progress line, newline-terminated and flushed, to a writer
pub struct WriterProgress<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterProgress<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ProgressLog for WriterProgress<W> {
    fn line(&self, message: &str) {
        tracing::debug!("{}", message);

        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };

        // A closed consumer must not fail the sync itself
        if let Err(e) = writeln!(writer, "{}", message).and_then(|_| writer.flush()) {
            tracing::warn!("Failed to write progress line: {}", e);
        }
    }
}
