use std::sync::Mutex;

use crate::events::{LogBuffer, LogEntry};

/// Presentation surface the pipeline reports to.
///
/// These are the only coupling points between the orchestration core and
/// whatever renders it (terminal, GUI, test recorder). Methods take `&self`
/// so the reporter can be shared by the progress and message callbacks of
/// a single poll loop; implementations use interior mutability.
pub trait Reporter: Send + Sync {
    /// Total pipeline progress, already clamped to 0–100.
    fn report_progress(&self, percent: f64);

    /// A status line. `replace_last` overwrites the previous line.
    fn log_event(&self, entry: &LogEntry, replace_last: bool);

    fn show_images(&self, urls: &[String]);

    fn show_video(&self, url: &str);

    /// Enable or disable the control that starts a run.
    fn set_control_enabled(&self, enabled: bool);

    /// Drop results from a previous run.
    fn clear_results(&self) {}
}

#[derive(Debug, Default)]
struct Recorded {
    progress: Vec<f64>,
    log: LogBuffer,
    images: Vec<Vec<String>>,
    videos: Vec<String>,
    control: Vec<bool>,
    clears: usize,
}

/// Headless reporter that keeps everything in memory.
///
/// Useful for embedding the pipeline without a display and for asserting
/// on what a run surfaced.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    inner: Mutex<Recorded>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        // Recorded data stays valid after a panic elsewhere.
        let mut guard = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    /// Every progress value reported, in order.
    pub fn progress_history(&self) -> Vec<f64> {
        self.with(|r| r.progress.clone())
    }

    pub fn last_progress(&self) -> Option<f64> {
        self.with(|r| r.progress.last().copied())
    }

    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.with(|r| r.log.entries().to_vec())
    }

    /// Each `show_images` call, in order.
    pub fn image_sets(&self) -> Vec<Vec<String>> {
        self.with(|r| r.images.clone())
    }

    pub fn videos(&self) -> Vec<String> {
        self.with(|r| r.videos.clone())
    }

    pub fn control_history(&self) -> Vec<bool> {
        self.with(|r| r.control.clone())
    }

    pub fn clear_count(&self) -> usize {
        self.with(|r| r.clears)
    }
}

impl Reporter for MemoryReporter {
    fn report_progress(&self, percent: f64) {
        self.with(|r| r.progress.push(percent));
    }

    fn log_event(&self, entry: &LogEntry, replace_last: bool) {
        self.with(|r| r.log.push(entry.clone(), replace_last));
    }

    fn show_images(&self, urls: &[String]) {
        self.with(|r| r.images.push(urls.to_vec()));
    }

    fn show_video(&self, url: &str) {
        self.with(|r| r.videos.push(url.to_string()));
    }

    fn set_control_enabled(&self, enabled: bool) {
        self.with(|r| r.control.push(enabled));
    }

    /// Clears shown results and the log; progress history is kept.
    fn clear_results(&self) {
        self.with(|r| {
            r.clears += 1;
            r.log.clear();
            r.images.clear();
            r.videos.clear();
        });
    }
}
