use indicatif::{ProgressBar, ProgressStyle};
use reel_pipeline::{LogEntry, Reporter, Severity};

/// Terminal reporter: progress bar for total progress, replace-last events
/// as the bar message, everything else printed above the bar.
pub struct ConsoleReporter {
    bar: ProgressBar,
    endpoint: String,
}

impl ConsoleReporter {
    pub fn new(endpoint: &str) -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self {
            bar,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Server URLs come back as paths; make them clickable.
    fn absolute(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.endpoint, url)
        } else {
            url.to_string()
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report_progress(&self, percent: f64) {
        self.bar.set_position(percent.round() as u64);
    }

    fn log_event(&self, entry: &LogEntry, replace_last: bool) {
        if replace_last {
            self.bar.set_message(entry.message.clone());
            return;
        }
        let tag = match entry.severity {
            Severity::Info => "     ",
            Severity::Success => "  ok ",
            Severity::Warning => "warn ",
            Severity::Error => "error",
        };
        self.bar.println(format!("{} {}", tag, entry));
        self.bar.set_message(String::new());
    }

    fn show_images(&self, urls: &[String]) {
        self.bar.println(format!("Generated {} images:", urls.len()));
        for url in urls {
            self.bar.println(format!("  {}", self.absolute(url)));
        }
    }

    fn show_video(&self, url: &str) {
        self.bar.println(format!("Video ready: {}", self.absolute(url)));
    }

    fn set_control_enabled(&self, enabled: bool) {
        if enabled {
            self.bar.abandon();
        } else {
            self.bar.reset();
        }
    }
}
