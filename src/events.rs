use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::report::Reporter;

/// Severity tag on a user-facing log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// Diagnostic level an entry of this severity is mirrored at.
    pub fn level(&self) -> tracing::Level {
        match self {
            Severity::Info | Severity::Success => tracing::Level::INFO,
            Severity::Warning => tracing::Level::WARN,
            Severity::Error => tracing::Level::ERROR,
        }
    }
}

/// A timestamped status line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            timestamp: Local::now(),
            severity,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Builds log entries and hands them to a [`Reporter`].
///
/// Each entry is mirrored to `tracing` so the status stream also shows up
/// in diagnostics.
pub struct EventLogger<'a, R: Reporter + ?Sized> {
    reporter: &'a R,
}

impl<'a, R: Reporter + ?Sized> EventLogger<'a, R> {
    pub fn new(reporter: &'a R) -> Self {
        Self { reporter }
    }

    pub fn log(&self, message: impl Into<String>, severity: Severity, replace_last: bool) {
        let entry = LogEntry::new(message, severity);
        match severity.level() {
            tracing::Level::ERROR => tracing::error!(text = %entry.message, "pipeline event"),
            tracing::Level::WARN => tracing::warn!(text = %entry.message, "pipeline event"),
            _ => tracing::info!(severity = severity.as_str(), text = %entry.message, "pipeline event"),
        }
        self.reporter.log_event(&entry, replace_last);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(message, Severity::Info, false);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.log(message, Severity::Success, false);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(message, Severity::Error, false);
    }

    /// Overwrite the most recent line (used for high-frequency poll messages).
    pub fn replace(&self, message: impl Into<String>) {
        self.log(message, Severity::Info, true);
    }
}

/// Append-or-replace line buffer, the way a terminal panel keeps its log.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    entries: Vec<LogEntry>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replacing on an empty buffer appends instead.
    pub fn push(&mut self, entry: LogEntry, replace_last: bool) {
        match self.entries.last_mut() {
            Some(last) if replace_last => *last = entry,
            _ => self.entries.push(entry),
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
